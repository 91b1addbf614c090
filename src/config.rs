use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::merge::MergeStrategy;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aggregation: AggregationConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Fraction of the dataset's total weight below which leaves are
    /// collapsed into an "Other" record; 0 disables collapsing.
    pub threshold: f64,
    /// Field that receives the aggregate summary label.
    pub summary_field: String,
    pub concat_separator: String,
    /// Per-field merge strategy overrides, e.g. `city = "concat"`.
    pub strategies: HashMap<String, MergeStrategy>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            threshold: 0.0,
            summary_field: "label".to_string(),
            concat_separator: " + ".to_string(),
            strategies: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            width: 960.0,
            height: 540.0,
            padding: 1.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("canopy").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.aggregation.threshold, 0.0);
        assert_eq!(config.aggregation.summary_field, "label");
        assert_eq!(config.layout.width, 960.0);
        assert_eq!(config.layout.padding, 1.0);
        assert!(!config.output.pretty);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[aggregation]
threshold = 0.02
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!((config.aggregation.threshold - 0.02).abs() < f64::EPSILON);
        // Other fields should be defaults
        assert_eq!(config.aggregation.summary_field, "label");
        assert_eq!(config.layout.height, 540.0);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[aggregation]
threshold = 0.05
summary_field = "name"
concat_separator = "/"

[aggregation.strategies]
city = "concat"
sales = "mean"

[layout]
width = 800
height = 600
padding = 2.0

[output]
pretty = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!((config.aggregation.threshold - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.aggregation.summary_field, "name");
        assert_eq!(config.aggregation.concat_separator, "/");
        assert_eq!(
            config.aggregation.strategies.get("city"),
            Some(&MergeStrategy::Concat)
        );
        assert_eq!(
            config.aggregation.strategies.get("sales"),
            Some(&MergeStrategy::Mean)
        );
        assert_eq!(config.layout.width, 800.0);
        assert_eq!(config.layout.padding, 2.0);
        assert!(config.output.pretty);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.layout.width, 960.0);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("canopy_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.layout.width, 960.0);
        let _ = std::fs::remove_file(&temp);
    }
}
