use crate::error::ConfigError;
use std::collections::BTreeMap;

const DEFAULT_ROADS: &str = "A,B";

#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    /// Canonical (upper-case) identifier, as echoed back to clients.
    pub id: String,
    /// Record path in the realtime database, e.g. `/ambulance_flag_A`.
    pub path: String,
}

/// The recognized road identifiers and the record each one writes to.
/// Lookups ignore case.
#[derive(Debug, Clone)]
pub struct RoadTable {
    roads: BTreeMap<String, Road>,
}

impl Default for RoadTable {
    fn default() -> Self {
        RoadTable::parse(DEFAULT_ROADS).expect("default road table is valid")
    }
}

impl RoadTable {
    /// Parses a comma-separated list of `ID` or `ID=/record/path` entries.
    pub fn parse(list: &str) -> Result<RoadTable, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            name: "ROADS",
            reason,
        };
        let mut roads = BTreeMap::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, path) = match entry.find('=') {
                Some(i) => (entry[..i].trim(), entry[i + 1..].trim().to_string()),
                None => (entry, format!("/ambulance_flag_{}", entry.to_uppercase())),
            };
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(format!("bad road identifier {:?}", id)));
            }
            if path.trim_matches('/').is_empty() {
                return Err(invalid(format!("empty record path for road {}", id)));
            }
            let id = id.to_uppercase();
            let road = Road {
                id: id.clone(),
                path,
            };
            if roads.insert(id.clone(), road).is_some() {
                return Err(invalid(format!("road {} listed twice", id)));
            }
        }
        if roads.is_empty() {
            return Err(invalid("no roads configured".to_string()));
        }
        Ok(RoadTable { roads })
    }

    pub fn resolve(&self, raw: &str) -> Option<&Road> {
        self.roads.get(&raw.to_uppercase())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.roads.keys().map(String::as_str)
    }
}
