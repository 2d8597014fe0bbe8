//! Character-origin records: races, classes, backgrounds and feats.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, Statement};

use super::{DocumentRef, Record, Speed, json_column, null_default, to_json};
use crate::Category;

/// Ability score bonus granted by a race or subrace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AbilityScoreIncrease {
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Subrace {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub asi: Vec<AbilityScoreIncrease>,
    #[serde(default, deserialize_with = "null_default")]
    pub traits: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Race {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(rename = "asi", default, deserialize_with = "null_default")]
    pub ability_scores: Vec<AbilityScoreIncrease>,
    #[serde(default, deserialize_with = "null_default")]
    pub age: String,
    #[serde(default, deserialize_with = "null_default")]
    pub alignment: String,
    #[serde(default, deserialize_with = "null_default")]
    pub size: String,
    #[serde(default, deserialize_with = "null_default")]
    pub speed: Speed,
    #[serde(default, deserialize_with = "null_default")]
    pub languages: String,
    #[serde(default, deserialize_with = "null_default")]
    pub vision: String,
    #[serde(default, deserialize_with = "null_default")]
    pub traits: String,
    #[serde(default, deserialize_with = "null_default")]
    pub subraces: Vec<Subrace>,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Race {
    const CATEGORY: Category = Category::Races;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "ability_scores",
        "age",
        "alignment",
        "size",
        "speed",
        "languages",
        "vision",
        "traits",
        "subraces",
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
            to_json(&self.ability_scores)?,
            self.age,
            self.alignment,
            self.size,
            to_json(&self.speed)?,
            self.languages,
            self.vision,
            self.traits,
            to_json(&self.subraces)?,
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
            ability_scores: json_column(row, 3)?,
            age: row.get(4)?,
            alignment: row.get(5)?,
            size: row.get(6)?,
            speed: json_column(row, 7)?,
            languages: row.get(8)?,
            vision: row.get(9)?,
            traits: row.get(10)?,
            subraces: json_column(row, 11)?,
            document: DocumentRef { slug: row.get(12)?, title: row.get(13)?, url: row.get(14)? },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Archetype {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Class {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub hit_dice: String,
    #[serde(default, deserialize_with = "null_default")]
    pub hp_at_1st_level: String,
    #[serde(default, deserialize_with = "null_default")]
    pub hp_at_higher_levels: String,
    #[serde(default, deserialize_with = "null_default")]
    pub prof_armor: String,
    #[serde(default, deserialize_with = "null_default")]
    pub prof_weapons: String,
    #[serde(default, deserialize_with = "null_default")]
    pub prof_tools: String,
    #[serde(default, deserialize_with = "null_default")]
    pub prof_saving_throws: String,
    #[serde(default, deserialize_with = "null_default")]
    pub prof_skills: String,
    #[serde(default, deserialize_with = "null_default")]
    pub equipment: String,
    #[serde(rename = "table", default, deserialize_with = "null_default")]
    pub table_data: String,
    #[serde(default, deserialize_with = "null_default")]
    pub spellcasting_ability: String,
    #[serde(default, deserialize_with = "null_default")]
    pub subtypes_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub archetypes: Vec<Archetype>,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Class {
    const CATEGORY: Category = Category::Classes;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "hit_dice",
        "hp_at_1st_level",
        "hp_at_higher_levels",
        "prof_armor",
        "prof_weapons",
        "prof_tools",
        "prof_saving_throws",
        "prof_skills",
        "equipment",
        "table_data",
        "spellcasting_ability",
        "subtypes_name",
        "archetypes",
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
            self.hit_dice,
            self.hp_at_1st_level,
            self.hp_at_higher_levels,
            self.prof_armor,
            self.prof_weapons,
            self.prof_tools,
            self.prof_saving_throws,
            self.prof_skills,
            self.equipment,
            self.table_data,
            self.spellcasting_ability,
            self.subtypes_name,
            to_json(&self.archetypes)?,
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
            hit_dice: row.get(3)?,
            hp_at_1st_level: row.get(4)?,
            hp_at_higher_levels: row.get(5)?,
            prof_armor: row.get(6)?,
            prof_weapons: row.get(7)?,
            prof_tools: row.get(8)?,
            prof_saving_throws: row.get(9)?,
            prof_skills: row.get(10)?,
            equipment: row.get(11)?,
            table_data: row.get(12)?,
            spellcasting_ability: row.get(13)?,
            subtypes_name: row.get(14)?,
            archetypes: json_column(row, 15)?,
            document: DocumentRef { slug: row.get(16)?, title: row.get(17)?, url: row.get(18)? },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Background {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub skill_proficiencies: String,
    #[serde(default, deserialize_with = "null_default")]
    pub tool_proficiencies: String,
    #[serde(default, deserialize_with = "null_default")]
    pub languages: String,
    #[serde(default, deserialize_with = "null_default")]
    pub equipment: String,
    #[serde(default, deserialize_with = "null_default")]
    pub feature: String,
    #[serde(default, deserialize_with = "null_default")]
    pub feature_desc: String,
    #[serde(default, deserialize_with = "null_default")]
    pub suggested_characteristics: String,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Background {
    const CATEGORY: Category = Category::Backgrounds;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "skill_proficiencies",
        "tool_proficiencies",
        "languages",
        "equipment",
        "feature",
        "feature_desc",
        "suggested_characteristics",
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
            self.skill_proficiencies,
            self.tool_proficiencies,
            self.languages,
            self.equipment,
            self.feature,
            self.feature_desc,
            self.suggested_characteristics,
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
            skill_proficiencies: row.get(3)?,
            tool_proficiencies: row.get(4)?,
            languages: row.get(5)?,
            equipment: row.get(6)?,
            feature: row.get(7)?,
            feature_desc: row.get(8)?,
            suggested_characteristics: row.get(9)?,
            document: DocumentRef { slug: row.get(10)?, title: row.get(11)?, url: row.get(12)? },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Feat {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default)]
    pub prerequisite: Option<String>,
    #[serde(alias = "effects_desc", default, deserialize_with = "null_default")]
    pub effects: Vec<String>,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Feat {
    const CATEGORY: Category = Category::Feats;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "prerequisite",
        "effects",
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
            self.prerequisite,
            to_json(&self.effects)?,
            self.document.slug,
            self.document.title,
            self.document.url,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let effects: Option<String> = row.get(4)?;
        let effects = match effects {
            Some(_) => json_column(row, 4)?,
            None => Vec::new(),
        };

        Ok(Self {
            slug: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            prerequisite: row.get(3)?,
            effects,
            document: DocumentRef { slug: row.get(5)?, title: row.get(6)?, url: row.get(7)? },
        })
    }
}
