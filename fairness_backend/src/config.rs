//! Per-table house configuration.
//!
//! Tables are described in JSON; every field is optional and falls back to the
//! 1% house edge and the default mines curve:
//!
//! ```json
//! { "dice": { "house_edge": 0.01 },
//!   "mines": { "house_edge": 0.02, "curve": { "cleared_weight": 10.0, "bonus_factor": 1.5 } } }
//! ```

use std::path::Path;

use candid::{CandidType, Deserialize};
use serde::Serialize;

use crate::error::{ConfigError, FairnessError, Result};
use crate::payout::{validate_house_edge, MinesPayoutCurve};
use crate::types::DEFAULT_HOUSE_EDGE;

fn default_house_edge() -> f64 {
    DEFAULT_HOUSE_EDGE
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct DiceTable {
    #[serde(default = "default_house_edge")]
    pub house_edge: f64,
}

impl Default for DiceTable {
    fn default() -> Self {
        Self {
            house_edge: DEFAULT_HOUSE_EDGE,
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MinesTable {
    #[serde(default = "default_house_edge")]
    pub house_edge: f64,
    #[serde(default)]
    pub curve: MinesPayoutCurve,
}

impl Default for MinesTable {
    fn default() -> Self {
        Self {
            house_edge: DEFAULT_HOUSE_EDGE,
            curve: MinesPayoutCurve::default(),
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct TableConfig {
    #[serde(default)]
    pub dice: DiceTable,
    #[serde(default)]
    pub mines: MinesTable,
}

impl TableConfig {
    /// Same house edge for both games.
    pub fn with_house_edge(house_edge: f64) -> std::result::Result<Self, ConfigError> {
        let config = Self {
            dice: DiceTable { house_edge },
            mines: MinesTable {
                house_edge,
                ..MinesTable::default()
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FairnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_house_edge(self.dice.house_edge)?;
        validate_house_edge(self.mines.house_edge)?;
        self.mines.curve.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TableConfig::default();
        assert_eq!(config.dice.house_edge, 0.01);
        assert_eq!(config.mines.house_edge, 0.01);
        assert_eq!(config.mines.curve.cleared_weight, 10.0);
        assert_eq!(config.mines.curve.bonus_factor, 1.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        assert_eq!(TableConfig::from_json_str("{}").unwrap(), TableConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config =
            TableConfig::from_json_str(r#"{"dice":{"house_edge":0.02},"mines":{"curve":{"cleared_weight":8.0,"bonus_factor":2.0}}}"#)
                .unwrap();
        assert_eq!(config.dice.house_edge, 0.02);
        assert_eq!(config.mines.house_edge, 0.01);
        assert_eq!(config.mines.curve.cleared_weight, 8.0);
        assert_eq!(config.mines.curve.bonus_factor, 2.0);
    }

    #[test]
    fn test_invalid_edge_rejected() {
        let err = TableConfig::from_json_str(r#"{"mines":{"house_edge":1.5}}"#).unwrap_err();
        assert!(matches!(
            err,
            FairnessError::Config(ConfigError::InvalidHouseEdge { .. })
        ));
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(matches!(
            TableConfig::from_json_str("{not json"),
            Err(FairnessError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            TableConfig::from_path("/definitely/not/here.json"),
            Err(FairnessError::Io { .. })
        ));
    }

    #[test]
    fn test_with_house_edge() {
        let config = TableConfig::with_house_edge(0.03).unwrap();
        assert_eq!(config.dice.house_edge, 0.03);
        assert_eq!(config.mines.house_edge, 0.03);
        assert!(TableConfig::with_house_edge(1.0).is_err());
    }
}
