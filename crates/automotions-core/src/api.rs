//! Records of the tournament API feed. Unknown fields are ignored so full API
//! dumps deserialize as-is.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTournament {
    #[serde(default)]
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRound {
    pub url: String,
    pub seq: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMotionRound {
    /// URL of the round this motion was set in.
    pub round: String,
    pub seq: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMotion {
    pub url: String,
    pub text: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub info_slide: String,
    #[serde(default)]
    pub rounds: Vec<ApiMotionRound>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ApiError> {
    let text = fs::read_to_string(path).map_err(|source| ApiError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ApiError::Json {
        path: path.display().to_string(),
        source,
    })
}
