//! Domain models returned by the upstream fetchers.
//!
//! Every model serializes with PascalCase keys (the public wire format) and
//! deserializes from lowercased keys. Upstream bodies go through
//! [`from_str_tolerant`] first, which lowercases every object key and drops
//! `null` members, so field matching is case-insensitive and absent or null
//! fields fall back to their defaults.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "lowercase"), default)]
pub struct WeatherSnapshot {
    pub name: String,
    pub main: MainReadings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "lowercase"), default)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: i64,
    pub humidity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "lowercase"), default)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Envelope the news upstream wraps its articles in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase", default)]
pub struct NewsEnvelope {
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "lowercase"), default)]
pub struct RepositoryEntry {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub owner: RepositoryOwner,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "lowercase"), default)]
pub struct RepositoryOwner {
    pub login: String,
    pub url: String,
}

/// Combined payload of one aggregate call. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AggregateResult {
    pub weather: WeatherSnapshot,
    pub news: Vec<NewsArticle>,
    pub repositories: Vec<RepositoryEntry>,
}

/// Parse an upstream JSON body into `T`, matching object keys
/// case-insensitively and treating `null` members as absent.
pub fn from_str_tolerant<T: DeserializeOwned>(body: &str) -> serde_json::Result<T> {
    let raw: Value = serde_json::from_str(body)?;
    serde_json::from_value(normalize_keys(raw))
}

fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (k, v) in obj {
                if v.is_null() {
                    continue;
                }
                out.insert(k.to_lowercase(), normalize_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}
