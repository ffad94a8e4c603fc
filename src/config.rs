use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};

use crate::flowcell::grid::{DEFAULT_MIN_POLY_G, DEFAULT_X_SIZE, DEFAULT_Y_SIZE};
use crate::flowcell::{DiscardPolicy, GridConfig};
use crate::helper::barcode::ExpectedBarcodes;
use crate::helper::json::FromJsonString;
use crate::pipelines::PipelineError;

pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// Run configuration, read from a JSON file. Every field is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QcConfig {
    #[serde(alias = "xSize", deserialize_with = "string_or_number_to_u32")]
    pub x_size: u32,
    #[serde(alias = "ySize", deserialize_with = "string_or_number_to_u32")]
    pub y_size: u32,
    #[serde(alias = "minPolyG", deserialize_with = "string_or_number_to_usize")]
    pub min_poly_g: usize,

    /// Average reads per micro-tile the widen step aims for.
    #[serde(alias = "targetReads", deserialize_with = "string_or_number_to_option_u64")]
    pub target_reads: Option<u64>,

    /// Worker threads for populating; 0 lets rayon decide.
    #[serde(deserialize_with = "string_or_number_to_usize")]
    pub threads: usize,
    /// Reads per shard handed to one worker.
    #[serde(alias = "chunkSize", deserialize_with = "string_or_number_to_usize")]
    pub chunk_size: usize,

    #[serde(alias = "barcodes")]
    pub expected_barcodes: Vec<String>,

    pub discard: DiscardPolicy,
}

impl Default for QcConfig {
    fn default() -> Self {
        QcConfig {
            x_size: DEFAULT_X_SIZE,
            y_size: DEFAULT_Y_SIZE,
            min_poly_g: DEFAULT_MIN_POLY_G,
            target_reads: None,
            threads: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            expected_barcodes: Vec::new(),
            discard: DiscardPolicy::default(),
        }
    }
}

impl QcConfig {
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::ConfigRead(path.display().to_string(), e))?;
        QcConfig::from_json_string(&text)
            .map_err(|e| PipelineError::ConfigParse(path.display().to_string(), e))
    }

    /// The file at `path` when given, defaults otherwise.
    pub fn from_optional_path(path: Option<&str>) -> Result<Self, PipelineError> {
        match path {
            Some(p) => QcConfig::from_path(Path::new(p)),
            None => Ok(QcConfig::default()),
        }
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig::new(self.x_size, self.y_size).with_min_poly_g(self.min_poly_g)
    }

    pub fn barcodes(&self) -> ExpectedBarcodes {
        ExpectedBarcodes::new(&self.expected_barcodes)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Display for QcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "grid {}, min poly-G {}, target reads {}, threads {}, chunk size {}, {} expected barcodes",
            self.grid(),
            self.min_poly_g,
            self.target_reads
                .map_or_else(|| "none".to_string(), |t| t.to_string()),
            self.threads,
            self.chunk_size,
            self.expected_barcodes.len()
        )
    }
}

fn parse_string_or_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let val: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match val {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(num) => num
            .to_string()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::custom(format!("Invalid number: {}", num))),
        serde_json::Value::String(s) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim()
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| Error::custom(format!("Invalid number: '{}'", s)))
            }
        }
        other => Err(Error::custom(format!("Expected a number, found {}", other))),
    }
}

fn string_or_number_to_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match parse_string_or_number::<D, u32>(deserializer)? {
        None => Err(Error::custom("Grid size must not be empty")),
        Some(0) => Err(Error::custom("Grid size must be at least 1")),
        Some(size) => Ok(size),
    }
}

fn string_or_number_to_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_string_or_number(deserializer)?.unwrap_or(0))
}

fn string_or_number_to_option_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_string_or_number(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = QcConfig::from_json_string("{}").unwrap();
        assert_eq!(config.grid(), GridConfig::default());
        assert_eq!(config.target_reads, None);
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert!(config.barcodes().is_empty());
    }

    #[test]
    fn test_string_or_number_fields() {
        let json = r#"{
            "xSize": "250",
            "y_size": 1000,
            "min_poly_g": "20",
            "target_reads": "800",
            "threads": 4,
            "expected_barcodes": ["ACGT+TTTT"],
            "discard": {"max_poly_g_fraction": 0.5}
        }"#;
        let config = QcConfig::from_json_string(json).unwrap();
        let grid = config.grid();
        assert_eq!((grid.x_size(), grid.y_size(), grid.min_poly_g()), (250, 1000, 20));
        assert_eq!(config.target_reads, Some(800));
        assert_eq!(config.threads, 4);
        assert_eq!(config.discard.max_poly_g_fraction, 0.5);
        assert_eq!(config.discard.quality_deviations, 2.4);
        assert_eq!(config.barcodes().nearest_distance("ACGTTTTA"), Some(1));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(QcConfig::from_json_string(r#"{"x_size": "wide"}"#).is_err());
        assert!(QcConfig::from_json_string(r#"{"x_size": -5}"#).is_err());
        assert!(QcConfig::from_json_string(r#"{"target_reads": [1]}"#).is_err());
    }

    #[test]
    fn test_zero_grid_size_is_a_parse_error() {
        let err = QcConfig::from_json_string(r#"{"x_size": 0}"#).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
        assert!(QcConfig::from_json_string(r#"{"ySize": "0"}"#).is_err());

        let path = std::env::temp_dir().join(format!("flowcell_qc_zero_grid_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"xSize": 0, "ySize": 500}"#).unwrap();
        let err = QcConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse(..)));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = QcConfig::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
