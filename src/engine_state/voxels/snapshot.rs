//! # Snapshot Module
//!
//! A flat list of edited cells, used for save/load and replication.
//!
//! Each entry is keyed by the cell position formatted as `"x,y,z"`:
//!
//! ```json
//! { "entries": [ { "key": "8,30,8", "block": 5, "water_level": 0, "source": true } ] }
//! ```
//!
//! Restoring tolerates malformed input entry by entry: a bad key, an unknown
//! block id or an out-of-range water level skips that entry only.

use cgmath::Point3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    block::{BlockId, BlockRegistry, WATER},
    chunk::MAX_WATER_LEVEL,
};
use crate::core::{Error, Result};

/// One recorded cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Cell position formatted as `"x,y,z"`.
    pub key: String,
    pub block: BlockId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_level: Option<u8>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub source: bool,
}

/// The flat block-edit list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub entries: Vec<SnapshotEntry>,
}

/// Outcome of restoring a snapshot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub applied: usize,
    pub skipped: usize,
}

/// A snapshot entry that passed validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RestoredCell {
    pub pos: Point3<i32>,
    pub block: BlockId,
    pub water_level: Option<u8>,
    pub source: bool,
}

/// Formats a cell position as a snapshot key.
pub fn format_key(pos: Point3<i32>) -> String {
    format!("{},{},{}", pos.x, pos.y, pos.z)
}

/// Parses a snapshot key.
///
/// Each component must be a finite integer inside the `i32` range; numbers
/// written in float notation such as `"3.0"` are accepted.
pub fn parse_key(key: &str) -> Option<Point3<i32>> {
    let mut parts = key.split(',').map(|part| parse_integral(part.trim()));
    let x = parts.next()??;
    let y = parts.next()??;
    let z = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    Some(Point3::new(x, y, z))
}

fn parse_integral(text: &str) -> Option<i32> {
    let value: f64 = text.parse().ok()?;
    integral_i32(value)
}

fn integral_i32(value: f64) -> Option<i32> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

impl SnapshotEntry {
    pub fn new(pos: Point3<i32>, block: BlockId, water: Option<(u8, bool)>) -> Self {
        SnapshotEntry {
            key: format_key(pos),
            block,
            water_level: water.map(|(level, _)| level),
            source: water.is_some_and(|(_, source)| source),
        }
    }

    /// Reads an entry out of loosely typed JSON.
    ///
    /// # Returns
    /// `None` if a required field is missing or has the wrong shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let key = object.get("key")?.as_str()?.to_owned();
        let block = integral_i32(object.get("block")?.as_f64()?)?;
        let block = BlockId::try_from(block).ok()?;
        let water_level = match object.get("water_level") {
            None | Some(Value::Null) => None,
            Some(level) => {
                let level = integral_i32(level.as_f64()?)?;
                Some(u8::try_from(level).ok()?)
            }
        };
        let source = match object.get("source") {
            None | Some(Value::Null) => false,
            Some(flag) => flag.as_bool()?,
        };
        Some(SnapshotEntry {
            key,
            block,
            water_level,
            source,
        })
    }

    /// Checks the entry against the registry and decodes its key.
    pub fn validate(&self, registry: &dyn BlockRegistry) -> Option<RestoredCell> {
        let pos = parse_key(&self.key)?;
        if !registry.is_known(self.block) {
            return None;
        }
        let water_level = match self.water_level {
            Some(level) if level > MAX_WATER_LEVEL => return None,
            Some(_) if self.block != WATER => None,
            level => level,
        };
        Some(RestoredCell {
            pos,
            block: self.block,
            water_level,
            source: self.source && self.block == WATER,
        })
    }
}

impl BlockSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a snapshot document, dropping structurally malformed entries.
    ///
    /// Accepts either `{ "entries": [...] }` or a bare array of entries.
    ///
    /// # Returns
    /// The well-formed entries and the number of dropped ones.
    ///
    /// # Errors
    /// Fails only when the document itself is not JSON or has no entry list.
    pub fn from_json_lenient(json: &str) -> Result<(BlockSnapshot, usize)> {
        let document: Value = serde_json::from_str(json)?;
        let raw = match &document {
            Value::Array(entries) => entries,
            Value::Object(object) => match object.get("entries") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(Error::InvalidSnapshot("missing \"entries\" array".to_owned())),
            },
            _ => return Err(Error::InvalidSnapshot("expected an object or an array".to_owned())),
        };

        let entries: Vec<SnapshotEntry> = raw.iter().filter_map(SnapshotEntry::from_value).collect();
        let dropped = raw.len() - entries.len();
        Ok((BlockSnapshot { entries }, dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::DefaultBlockRegistry;

    #[test]
    fn test_key_parsing() {
        assert_eq!(parse_key("1,-2,3"), Some(Point3::new(1, -2, 3)));
        assert_eq!(parse_key(" 4 , 5 ,6"), Some(Point3::new(4, 5, 6)));
        assert_eq!(parse_key("7.0,8,9"), Some(Point3::new(7, 8, 9)));
        assert_eq!(parse_key("1.5,2,3"), None);
        assert_eq!(parse_key("NaN,2,3"), None);
        assert_eq!(parse_key("inf,2,3"), None);
        assert_eq!(parse_key("1,2"), None);
        assert_eq!(parse_key("1,2,3,4"), None);
        assert_eq!(parse_key("9999999999,0,0"), None);
        assert_eq!(parse_key(&format_key(Point3::new(-40, 12, 7))), Some(Point3::new(-40, 12, 7)));
    }

    #[test]
    fn test_lenient_parse_drops_bad_shapes() {
        let json = r#"{ "entries": [
            { "key": "0,1,0", "block": 1 },
            { "key": 12, "block": 1 },
            { "key": "0,2,0" },
            { "key": "0,3,0", "block": -4 },
            { "key": "0,4,0", "block": 5, "water_level": 3, "source": true },
            "junk"
        ] }"#;
        let (snapshot, dropped) = BlockSnapshot::from_json_lenient(json).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(dropped, 4);
        assert_eq!(snapshot.entries[1].water_level, Some(3));
        assert!(snapshot.entries[1].source);
    }

    #[test]
    fn test_bare_array_is_accepted() {
        let (snapshot, dropped) = BlockSnapshot::from_json_lenient(r#"[{ "key": "1,1,1", "block": 2 }]"#).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_document_errors() {
        assert!(matches!(BlockSnapshot::from_json_lenient("{"), Err(Error::Json(_))));
        assert!(matches!(
            BlockSnapshot::from_json_lenient(r#"{ "cells": [] }"#),
            Err(Error::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_and_bad_levels() {
        let registry = DefaultBlockRegistry;
        let unknown = SnapshotEntry {
            key: "0,0,0".to_owned(),
            block: 4000,
            water_level: None,
            source: false,
        };
        assert_eq!(unknown.validate(&registry), None);

        let flooded = SnapshotEntry {
            key: "0,0,0".to_owned(),
            block: WATER,
            water_level: Some(9),
            source: false,
        };
        assert_eq!(flooded.validate(&registry), None);

        let stone = SnapshotEntry {
            key: "0,1,0".to_owned(),
            block: 1,
            water_level: Some(2),
            source: true,
        };
        let cell = stone.validate(&registry).unwrap();
        assert_eq!(cell.water_level, None);
        assert!(!cell.source);
    }

    #[test]
    fn test_serialized_form_omits_defaults() {
        let snapshot = BlockSnapshot {
            entries: vec![SnapshotEntry::new(Point3::new(1, 2, 3), 1, None)],
        };
        assert_eq!(snapshot.to_json().unwrap(), r#"{"entries":[{"key":"1,2,3","block":1}]}"#);
    }
}
