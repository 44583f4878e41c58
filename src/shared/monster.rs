//! Monster Data Structures
//!
//! Read model of a monster as returned by the catalog API, the fixed type
//! enumeration, and the request/response envelopes of the monster endpoints.

use crate::shared::error::SharedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of a single stat, used to normalize stat bars
pub const MAX_STAT: u32 = 255;

/// Maximum number of type tags on a monster (and in a type filter)
pub const MAX_TYPES: usize = 2;

/// Monster type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonsterType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl MonsterType {
    /// Every type, in display order
    pub const ALL: [MonsterType; 18] = [
        MonsterType::Normal,
        MonsterType::Fire,
        MonsterType::Water,
        MonsterType::Electric,
        MonsterType::Grass,
        MonsterType::Ice,
        MonsterType::Fighting,
        MonsterType::Poison,
        MonsterType::Ground,
        MonsterType::Flying,
        MonsterType::Psychic,
        MonsterType::Bug,
        MonsterType::Rock,
        MonsterType::Ghost,
        MonsterType::Dragon,
        MonsterType::Dark,
        MonsterType::Steel,
        MonsterType::Fairy,
    ];

    /// Wire representation (upper case)
    pub fn as_str(&self) -> &'static str {
        match self {
            MonsterType::Normal => "NORMAL",
            MonsterType::Fire => "FIRE",
            MonsterType::Water => "WATER",
            MonsterType::Electric => "ELECTRIC",
            MonsterType::Grass => "GRASS",
            MonsterType::Ice => "ICE",
            MonsterType::Fighting => "FIGHTING",
            MonsterType::Poison => "POISON",
            MonsterType::Ground => "GROUND",
            MonsterType::Flying => "FLYING",
            MonsterType::Psychic => "PSYCHIC",
            MonsterType::Bug => "BUG",
            MonsterType::Rock => "ROCK",
            MonsterType::Ghost => "GHOST",
            MonsterType::Dragon => "DRAGON",
            MonsterType::Dark => "DARK",
            MonsterType::Steel => "STEEL",
            MonsterType::Fairy => "FAIRY",
        }
    }
}

impl fmt::Display for MonsterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonsterType {
    type Err = SharedError;

    /// Case-insensitive, so `fire` and `FIRE` both parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        MonsterType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| SharedError::unknown_type(s))
    }
}

/// The six battle stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub special_attack: u32,
    pub special_defense: u32,
}

impl Stats {
    /// Sum of all six stats, widened so out-of-range server values cannot overflow
    pub fn total(&self) -> u64 {
        [
            self.hp,
            self.attack,
            self.defense,
            self.speed,
            self.special_attack,
            self.special_defense,
        ]
        .iter()
        .map(|&v| u64::from(v))
        .sum()
    }

    /// Stat as a fraction of [`MAX_STAT`], clamped to 1.0
    pub fn normalized(value: u32) -> f32 {
        value.min(MAX_STAT) as f32 / MAX_STAT as f32
    }

    pub fn is_within_bounds(&self) -> bool {
        [
            self.hp,
            self.attack,
            self.defense,
            self.speed,
            self.special_attack,
            self.special_defense,
        ]
        .iter()
        .all(|v| *v <= MAX_STAT)
    }
}

/// Owner of a monster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterOwner {
    pub name: String,
}

/// Monster read model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub user: MonsterOwner,
    #[serde(flatten)]
    pub stats: Stats,
    #[serde(default)]
    pub types: Vec<MonsterType>,
}

/// Pagination block of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_items: u64,
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn total_pages(&self) -> u32 {
        crate::shared::pagination::total_pages(self.total_items, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Response of `GET /monsters` and `GET /monsters/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonstersResponse {
    pub monsters: Vec<Monster>,
    pub pagination: Pagination,
}

/// Response of `GET /monster/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterResponse {
    pub monster: Monster,
}

/// Body of `POST /monsters/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMonsterRequest {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    pub types: Vec<MonsterType>,
}

/// Response of `POST /monsters/create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMonsterResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Ids arrive as strings from list endpoints and as numbers from creation
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
