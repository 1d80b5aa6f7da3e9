/// Aircraft type name to detector class id mapping.
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Loaded from a JSON object such as `{"su24": 0, "tu22m": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMap {
    ids: BTreeMap<String, u32>,
}

impl ClassMap {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SynthError::dataset(path, format!("cannot read class map: {}", e)))?;
        let map: ClassMap = serde_json::from_str(&text)?;
        if map.ids.is_empty() {
            return Err(SynthError::dataset(path, "class map is empty"));
        }
        Ok(map)
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            ids: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn class_id(&self, base_type: &str) -> Result<u32> {
        self.ids
            .get(base_type)
            .copied()
            .ok_or_else(|| SynthError::UnknownClass {
                name: base_type.to_string(),
            })
    }

    /// First type name mapped to `id`, used for reporting.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.as_str())
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.ids.values().any(|v| *v == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
