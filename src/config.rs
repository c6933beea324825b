//! Dashboard configuration, read from an optional JSON file.

use crate::data::Operator;
use crate::stats::{PeriodOrder, DEFAULT_PERIODS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATA_PATH: &str = "Datos_reporteFB.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: at least one period is required")]
    NoPeriods,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// CSV loaded at startup.
    pub data_path: PathBuf,
    /// Period labels, oldest first.
    pub periods: Vec<String>,
    /// Operator shown in the province and locality charts.
    pub focus_operator: Operator,
    /// Size of exported chart images, in pixels.
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            periods: DEFAULT_PERIODS.iter().map(|p| p.to_string()).collect(),
            focus_operator: Operator::Claro,
            chart_width: 1200,
            chart_height: 700,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.periods.is_empty() {
            return Err(ConfigError::NoPeriods);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn period_order(&self) -> PeriodOrder {
        PeriodOrder::new(self.periods.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.period_order().labels().len(), 6);
    }

    #[test]
    fn overrides_are_applied() {
        let config = DashboardConfig::from_json(
            r#"{ "data_path": "otro.csv", "periods": ["2024-01", "2024-02"], "focus_operator": "Personal" }"#,
        )
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("otro.csv"));
        assert_eq!(config.focus_operator, Operator::Personal);
        assert_eq!(config.period_order().previous("2024-02"), Some("2024-01"));
        assert_eq!(config.chart_width, 1200);
    }

    #[test]
    fn unknown_fields_and_empty_periods_are_rejected() {
        assert!(matches!(
            DashboardConfig::from_json(r#"{ "colour": "red" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DashboardConfig::from_json(r#"{ "periods": [] }"#),
            Err(ConfigError::NoPeriods)
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thp_dashboard.json");
        std::fs::write(&path, r#"{ "chart_width": 800 }"#).unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap().chart_width, 800);
        assert!(matches!(
            DashboardConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
