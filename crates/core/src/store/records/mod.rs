//! Typed reference records.
//!
//! Each struct deserializes straight from the upstream JSON (field names
//! follow the upstream API) and knows how to write itself to, and read
//! itself back from, its reference table. Nested values are JSON text
//! columns decoded into explicit types, so a shape change shows up as a
//! row conversion error instead of silently drifting.

mod items;
mod monster;
mod origins;
mod spell;

pub use items::{MagicItem, Weapon};
pub use monster::{Monster, MonsterAction};
pub use origins::{AbilityScoreIncrease, Archetype, Background, Class, Feat, Race, Subrace};
pub use spell::Spell;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tokio_rusqlite::rusqlite::{self, Row, Statement, types::Type};

use crate::Category;

/// A record that can be bulk-stored in, and read from, a reference table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Category whose table holds this record.
    const CATEGORY: Category;

    /// Table columns in bind order. `slug` comes first.
    const COLUMNS: &'static [&'static str];

    fn slug(&self) -> &str;

    /// Bind this record to a prepared upsert and execute it.
    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;

    /// Decode a row selected with [`Record::COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Source document a record was published in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DocumentRef {
    #[serde(rename = "document__slug", default, deserialize_with = "null_default")]
    pub slug: String,
    #[serde(rename = "document__title", default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(rename = "document__url", default, deserialize_with = "null_default")]
    pub url: String,
}

/// One movement mode of a speed map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum SpeedValue {
    Feet(i64),
    Flag(bool),
    Note(String),
}

/// Movement speeds keyed by mode (`walk`, `fly`, `hover`, ...).
pub type Speed = BTreeMap<String, SpeedValue>;

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Upsert statement for a record type: insert, or replace every column on
/// a slug conflict.
pub(crate) fn upsert_sql<R: Record>() -> String {
    let columns = R::COLUMNS.join(", ");
    let placeholders = (1..=R::COLUMNS.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = R::COLUMNS
        .iter()
        .skip(1)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({columns}) VALUES ({placeholders})
         ON CONFLICT(slug) DO UPDATE SET {updates}",
        table = R::CATEGORY.table()
    )
}

/// Select statement for a record type; append WHERE/ORDER BY as needed.
pub(crate) fn select_sql<R: Record>() -> String {
    format!("SELECT {} FROM {}", R::COLUMNS.join(", "), R::CATEGORY.table())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_sql_shape() {
        let sql = upsert_sql::<Feat>();
        assert!(sql.starts_with("INSERT INTO ref_feats (slug, name"));
        assert!(sql.contains("?8"));
        assert!(!sql.contains("?9"));
        assert!(sql.contains("ON CONFLICT(slug) DO UPDATE SET name = excluded.name"));
        assert!(!sql.contains("slug = excluded.slug"));
    }

    #[test]
    fn test_speed_values() {
        let speed: Speed = serde_json::from_str(r#"{"walk": 30, "hover": true, "notes": "swim only"}"#).unwrap();
        assert_eq!(speed["walk"], SpeedValue::Feet(30));
        assert_eq!(speed["hover"], SpeedValue::Flag(true));
        assert_eq!(speed["notes"], SpeedValue::Note("swim only".into()));
    }

    #[test]
    fn test_document_ref_nulls() {
        let doc: DocumentRef =
            serde_json::from_str(r#"{"document__slug": "wotc-srd", "document__title": null}"#).unwrap();
        assert_eq!(doc.slug, "wotc-srd");
        assert_eq!(doc.title, "");
        assert_eq!(doc.url, "");
    }
}
