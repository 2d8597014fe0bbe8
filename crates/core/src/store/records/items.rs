//! Equipment records: weapons and magic items.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, Statement};

use super::{DocumentRef, Record, json_column, null_default, to_json};
use crate::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Weapon {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cost: String,
    #[serde(default, deserialize_with = "null_default")]
    pub damage_dice: String,
    #[serde(default, deserialize_with = "null_default")]
    pub damage_type: String,
    #[serde(default, deserialize_with = "null_default")]
    pub weight: String,
    #[serde(default, deserialize_with = "null_default")]
    pub properties: Vec<String>,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for Weapon {
    const CATEGORY: Category = Category::Weapons;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "category",
        "cost",
        "damage_dice",
        "damage_type",
        "weight",
        "properties",
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
            self.category,
            self.cost,
            self.damage_dice,
            self.damage_type,
            self.weight,
            to_json(&self.properties)?,
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
            category: row.get(3)?,
            cost: row.get(4)?,
            damage_dice: row.get(5)?,
            damage_type: row.get(6)?,
            weight: row.get(7)?,
            properties: json_column(row, 8)?,
            document: DocumentRef { slug: row.get(9)?, title: row.get(10)?, url: row.get(11)? },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MagicItem {
    pub slug: String,
    pub name: String,
    #[serde(rename = "desc", default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_default")]
    pub rarity: String,
    #[serde(default, deserialize_with = "null_default")]
    pub requires_attunement: String,
    #[serde(flatten)]
    pub document: DocumentRef,
}

impl Record for MagicItem {
    const CATEGORY: Category = Category::MagicItems;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "name",
        "description",
        "type",
        "rarity",
        "requires_attunement",
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
            self.kind,
            self.rarity,
            self.requires_attunement,
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
            kind: row.get(3)?,
            rarity: row.get(4)?,
            requires_attunement: row.get(5)?,
            document: DocumentRef { slug: row.get(6)?, title: row.get(7)?, url: row.get(8)? },
        })
    }
}
