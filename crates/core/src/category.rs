//! Reference-data categories.
//!
//! A category names one upstream endpoint, one reference table and one
//! load-status row. Everything that branches on category matches on this
//! enum so a new category fails to compile until every site handles it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// One kind of reference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Races,
    Classes,
    Backgrounds,
    Spells,
    Monsters,
    Weapons,
    MagicItems,
    Feats,
}

impl Category {
    /// Every category, in load and search order.
    pub const ALL: [Category; 8] = [
        Category::Races,
        Category::Classes,
        Category::Backgrounds,
        Category::Spells,
        Category::Monsters,
        Category::Weapons,
        Category::MagicItems,
        Category::Feats,
    ];

    /// Upstream endpoint path segment, also used as the cache key prefix
    /// and cache category tag.
    pub fn path(self) -> &'static str {
        match self {
            Category::Races => "races",
            Category::Classes => "classes",
            Category::Backgrounds => "backgrounds",
            Category::Spells => "spells",
            Category::Monsters => "monsters",
            Category::Weapons => "weapons",
            Category::MagicItems => "magicitems",
            Category::Feats => "feats",
        }
    }

    /// Storage name, used as the load-status key.
    pub fn name(self) -> &'static str {
        match self {
            Category::MagicItems => "magic_items",
            other => other.path(),
        }
    }

    /// Singular tag attached to cross-category search hits.
    pub fn kind(self) -> &'static str {
        match self {
            Category::Races => "race",
            Category::Classes => "class",
            Category::Backgrounds => "background",
            Category::Spells => "spell",
            Category::Monsters => "monster",
            Category::Weapons => "weapon",
            Category::MagicItems => "magic_item",
            Category::Feats => "feat",
        }
    }

    /// Reference table holding this category's records.
    pub fn table(self) -> &'static str {
        match self {
            Category::Races => "ref_races",
            Category::Classes => "ref_classes",
            Category::Backgrounds => "ref_backgrounds",
            Category::Spells => "ref_spells",
            Category::Monsters => "ref_monsters",
            Category::Weapons => "ref_weapons",
            Category::MagicItems => "ref_magic_items",
            Category::Feats => "ref_feats",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts the upstream path or the storage name, with `-` read as `_`
    /// (`magicitems`, `magic_items`, `magic-items`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.path() == s || c.name() == normalized)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}
