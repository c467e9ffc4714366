// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Record types the sample payloads deserialize into.
//!
//! Field names follow the generated sample schema. Fields the schema carries
//! but the records do not model (`balance`, `about`) are skipped on input.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A person entry of a sample payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub index: i64,
    pub guid: Option<String>,
    #[serde(rename = "isActive")]
    pub active: bool,
    pub picture: Option<String>,
    pub age: i32,
    #[serde(rename = "eyeColor")]
    pub eye_color: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(with = "registered_format")]
    pub registered: Option<NaiveDateTime>,
    pub latitude: f32,
    pub longitude: f32,
    pub tags: Option<BTreeSet<String>>,
    pub friends: Option<Vec<Friend>>,
    pub greeting: Option<String>,
    #[serde(rename = "favoriteFruit")]
    pub favorite_fruit: Option<String>,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            id: None,
            index: -1,
            guid: None,
            active: false,
            picture: None,
            age: -1,
            eye_color: None,
            name: None,
            gender: None,
            company: None,
            email: None,
            phone: None,
            address: None,
            registered: None,
            latitude: -1.0,
            longitude: -1.0,
            tags: None,
            friends: None,
            greeting: None,
            favorite_fruit: None,
        }
    }
}

/// A friend reference nested in a [`Person`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Friend {
    pub id: i32,
    pub name: Option<String>,
}

impl Default for Friend {
    fn default() -> Self {
        Self { id: -1, name: None }
    }
}

/// `registered` is written as `yyyy-MM-dd'T'HH:mm:ss`. On input anything after
/// the pattern (the generator appends a zone offset) is ignored.
mod registered_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const PATTERN: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.collect_str(&dt.format(PATTERN)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => NaiveDateTime::parse_and_remainder(&text, PATTERN)
                .map(|(dt, _)| Some(dt))
                .map_err(|e| de::Error::custom(format!("invalid registered date '{text}': {e}"))),
        }
    }
}
