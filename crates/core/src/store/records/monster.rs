use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, Statement};

use super::{DocumentRef, Record, Speed, json_column, null_default, to_json};
use crate::Category;

/// Action, reaction or special ability in a stat block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MonsterAction {
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_bonus: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_dice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_bonus: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Monster {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub size: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub alignment: String,
    #[serde(default, deserialize_with = "null_default")]
    pub armor_class: i64,
    #[serde(default)]
    pub armor_desc: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub hit_points: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub hit_dice: String,
    #[serde(default, deserialize_with = "null_default")]
    pub speed: Speed,
    #[serde(default, deserialize_with = "null_default")]
    pub strength: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub dexterity: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub constitution: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub intelligence: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub wisdom: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub charisma: i64,
    #[serde(default)]
    pub strength_save: Option<i64>,
    #[serde(default)]
    pub dexterity_save: Option<i64>,
    #[serde(default)]
    pub constitution_save: Option<i64>,
    #[serde(default)]
    pub intelligence_save: Option<i64>,
    #[serde(default)]
    pub wisdom_save: Option<i64>,
    #[serde(default)]
    pub charisma_save: Option<i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub skills: BTreeMap<String, i64>,
    #[serde(default, deserialize_with = "null_default")]
    pub damage_vulnerabilities: String,
    #[serde(default, deserialize_with = "null_default")]
    pub damage_resistances: String,
    #[serde(default, deserialize_with = "null_default")]
    pub damage_immunities: String,
    #[serde(default, deserialize_with = "null_default")]
    pub condition_immunities: String,
    #[serde(default, deserialize_with = "null_default")]
    pub senses: String,
    #[serde(default, deserialize_with = "null_default")]
    pub languages: String,
    #[serde(default, deserialize_with = "null_default")]
    pub challenge_rating: String,
    /// Numeric challenge rating (`0.125` for "1/8").
    #[serde(default, deserialize_with = "null_default")]
    pub cr: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub actions: Vec<MonsterAction>,
    #[serde(default, deserialize_with = "null_default")]
    pub bonus_actions: Vec<MonsterAction>,
    #[serde(default, deserialize_with = "null_default")]
    pub reactions: Vec<MonsterAction>,
    #[serde(default, deserialize_with = "null_default")]
    pub legendary_desc: String,
    #[serde(default, deserialize_with = "null_default")]
    pub legendary_actions: Vec<MonsterAction>,
    #[serde(default, deserialize_with = "null_default")]
    pub special_abilities: Vec<MonsterAction>,
    #[serde(default, deserialize_with = "null_default")]
    pub spell_list: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub environments: Vec<String>,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Monster {
    const CATEGORY: Category = Category::Monsters;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "size",
        "type",
        "subtype",
        "alignment",
        "armor_class",
        "armor_desc",
        "hit_points",
        "hit_dice",
        "speed",
        "strength",
        "dexterity",
        "constitution",
        "intelligence",
        "wisdom",
        "charisma",
        "strength_save",
        "dexterity_save",
        "constitution_save",
        "intelligence_save",
        "wisdom_save",
        "charisma_save",
        "skills",
        "damage_vulnerabilities",
        "damage_resistances",
        "damage_immunities",
        "condition_immunities",
        "senses",
        "languages",
        "challenge_rating",
        "cr",
        "actions",
        "bonus_actions",
        "reactions",
        "legendary_desc",
        "legendary_actions",
        "special_abilities",
        "spell_list",
        "environments",
        "document_slug",
        "document_title",
        "document_url",
    ];

    fn slug(&self) -> &str {
        &self.slug
    }

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.slug,
            self.name,
            self.description,
            self.size,
            self.kind,
            self.subtype,
            self.alignment,
            self.armor_class,
            self.armor_desc,
            self.hit_points,
            self.hit_dice,
            to_json(&self.speed)?,
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
            self.strength_save,
            self.dexterity_save,
            self.constitution_save,
            self.intelligence_save,
            self.wisdom_save,
            self.charisma_save,
            to_json(&self.skills)?,
            self.damage_vulnerabilities,
            self.damage_resistances,
            self.damage_immunities,
            self.condition_immunities,
            self.senses,
            self.languages,
            self.challenge_rating,
            self.cr,
            to_json(&self.actions)?,
            to_json(&self.bonus_actions)?,
            to_json(&self.reactions)?,
            self.legendary_desc,
            to_json(&self.legendary_actions)?,
            to_json(&self.special_abilities)?,
            to_json(&self.spell_list)?,
            to_json(&self.environments)?,
            self.document.slug,
            self.document.title,
            self.document.url,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            slug: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            size: row.get(3)?,
            kind: row.get(4)?,
            subtype: row.get(5)?,
            alignment: row.get(6)?,
            armor_class: row.get(7)?,
            armor_desc: row.get(8)?,
            hit_points: row.get(9)?,
            hit_dice: row.get(10)?,
            speed: json_column(row, 11)?,
            strength: row.get(12)?,
            dexterity: row.get(13)?,
            constitution: row.get(14)?,
            intelligence: row.get(15)?,
            wisdom: row.get(16)?,
            charisma: row.get(17)?,
            strength_save: row.get(18)?,
            dexterity_save: row.get(19)?,
            constitution_save: row.get(20)?,
            intelligence_save: row.get(21)?,
            wisdom_save: row.get(22)?,
            charisma_save: row.get(23)?,
            skills: json_column(row, 24)?,
            damage_vulnerabilities: row.get(25)?,
            damage_resistances: row.get(26)?,
            damage_immunities: row.get(27)?,
            condition_immunities: row.get(28)?,
            senses: row.get(29)?,
            languages: row.get(30)?,
            challenge_rating: row.get(31)?,
            cr: row.get(32)?,
            actions: json_column(row, 33)?,
            bonus_actions: json_column(row, 34)?,
            reactions: json_column(row, 35)?,
            legendary_desc: row.get(36)?,
            legendary_actions: json_column(row, 37)?,
            special_abilities: json_column(row, 38)?,
            spell_list: json_column(row, 39)?,
            environments: json_column(row, 40)?,
            document: DocumentRef { slug: row.get(41)?, title: row.get(42)?, url: row.get(43)? },
        })
    }
}
