//! Persisted slot arrangement
//!
//! The serialized form of the slot table, written on every structural change
//! and read once at startup.

use serde::{Deserialize, Serialize};

use super::Uid;

/// Store key the arrangement is saved under
pub const ARRANGEMENT_KEY: &str = "slots.json";

/// One occupied slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub slot: usize,
    #[serde(rename = "type")]
    pub type_name: String,
    pub uid: Uid,
    #[serde(default)]
    pub alias: String,
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    /// Duration override in milliseconds (`None` = system default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// All occupied slots, ordered by slot index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrangement {
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
}

impl Arrangement {
    /// Parse a stored arrangement
    pub fn from_bytes(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Serialize for the store
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_record() {
        let data = br#"{ "slots": [ { "slot": 2, "type": "clock", "uid": 9, "enabled": true } ] }"#;
        let arrangement = Arrangement::from_bytes(data).unwrap();

        assert_eq!(arrangement.slots.len(), 1);
        let record = &arrangement.slots[0];
        assert_eq!(record.slot, 2);
        assert_eq!(record.type_name, "clock");
        assert_eq!(record.uid, 9);
        assert_eq!(record.alias, "");
        assert!(!record.locked);
        assert_eq!(record.duration_ms, None);
    }

    #[test]
    fn test_serialized_field_names() {
        let arrangement = Arrangement {
            slots: vec![SlotRecord {
                slot: 0,
                type_name: "text".to_string(),
                uid: 1,
                alias: "greeting".to_string(),
                enabled: true,
                locked: false,
                duration_ms: Some(5000),
            }],
        };

        let value: serde_json::Value =
            serde_json::from_slice(&arrangement.to_bytes().unwrap()).unwrap();
        assert_eq!(value["slots"][0]["type"], "text");
        assert_eq!(value["slots"][0]["duration_ms"], 5000);
    }

    #[test]
    fn test_malformed() {
        assert!(Arrangement::from_bytes(b"not json").is_err());
        assert!(Arrangement::from_bytes(b"{}").unwrap().is_empty());
    }
}
