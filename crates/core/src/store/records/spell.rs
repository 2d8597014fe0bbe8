use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, Statement};

use super::{DocumentRef, Record, json_column, null_default, to_json};
use crate::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Spell {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub higher_level: String,
    #[serde(default, deserialize_with = "null_default")]
    pub range: String,
    #[serde(default, deserialize_with = "null_default")]
    pub components: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(rename = "can_be_cast_as_ritual", default, deserialize_with = "null_default")]
    pub ritual: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub duration: String,
    #[serde(rename = "requires_concentration", default, deserialize_with = "null_default")]
    pub concentration: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub casting_time: String,
    #[serde(rename = "level_int", default, deserialize_with = "null_default")]
    pub level: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub school: String,
    /// Comma-separated class names, as published upstream.
    #[serde(rename = "dnd_class", default, deserialize_with = "null_default")]
    pub classes: String,
    #[serde(default, deserialize_with = "null_default")]
    pub spell_lists: Vec<String>,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Spell {
    const CATEGORY: Category = Category::Spells;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "higher_level",
        "range",
        "components",
        "material",
        "ritual",
        "duration",
        "concentration",
        "casting_time",
        "level",
        "school",
        "classes",
        "spell_lists",
        "document_slug",
        "document_title",
        "document_url",
    ];

    fn slug(&self) -> &str {
        &self.slug
    }

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        let material = self.material.as_deref().filter(|m| !m.is_empty());
        stmt.execute(params![
            self.slug,
            self.name,
            self.description,
            self.higher_level,
            self.range,
            self.components,
            material,
            self.ritual,
            self.duration,
            self.concentration,
            self.casting_time,
            self.level,
            self.school,
            self.classes,
            to_json(&self.spell_lists)?,
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
            higher_level: row.get(3)?,
            range: row.get(4)?,
            components: row.get(5)?,
            material: row.get(6)?,
            ritual: row.get(7)?,
            duration: row.get(8)?,
            concentration: row.get(9)?,
            casting_time: row.get(10)?,
            level: row.get(11)?,
            school: row.get(12)?,
            classes: row.get(13)?,
            spell_lists: json_column(row, 14)?,
            document: DocumentRef { slug: row.get(15)?, title: row.get(16)?, url: row.get(17)? },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_from_upstream_json() {
        let json = r#"{
            "slug": "fireball", "name": "Fireball", "desc": "A bright streak flashes.",
            "higher_level": "", "range": "150 feet", "components": "V, S, M",
            "material": "A tiny ball of bat guano and sulfur.",
            "can_be_cast_as_ritual": false, "duration": "Instantaneous",
            "requires_concentration": false, "casting_time": "1 action",
            "level_int": 3, "school": "Evocation", "dnd_class": "Sorcerer, Wizard",
            "spell_lists": ["sorcerer", "wizard"], "document__slug": "wotc-srd"
        }"#;

        let spell: Spell = serde_json::from_str(json).unwrap();
        assert_eq!(spell.level, 3);
        assert_eq!(spell.classes, "Sorcerer, Wizard");
        assert!(!spell.ritual);
        assert_eq!(spell.spell_lists.len(), 2);
    }

    #[test]
    fn test_spell_null_lists() {
        let json = r#"{"slug": "light", "name": "Light", "level_int": 0, "spell_lists": null}"#;
        let spell: Spell = serde_json::from_str(json).unwrap();
        assert!(spell.spell_lists.is_empty());
        assert!(spell.material.is_none());
    }
}
