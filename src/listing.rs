//! # List Output Formats
//!
//! Renders the maps produced by [`crate::versions`] for `gosh list`.
//!
//! - `yaml`: a mapping of key to value
//! - `properties`: `key=value` lines, sorted by key
//! - `json`: a JSON object
//!
//! Keys may carry a suffix (for example `app1.version=1.0.0`), configured per
//! listing kind under `output` in the configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Output format of `gosh list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Properties,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Properties => "properties",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "properties" | "props" => Ok(OutputFormat::Properties),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::UnsupportedOutputFormat {
                format: value.to_string(),
            }),
        }
    }
}

fn suffixed(key: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('.');
    if suffix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", key, suffix)
    }
}

/// Render `entries` with every key suffixed by `key_suffix` (if non-empty).
///
/// An empty map renders as an empty string in every format except JSON,
/// which renders `{}`.
pub fn render(
    format: OutputFormat,
    entries: &BTreeMap<String, String>,
    key_suffix: &str,
) -> Result<String> {
    let keyed: BTreeMap<String, &String> = entries
        .iter()
        .map(|(k, v)| (suffixed(k, key_suffix), v))
        .collect();

    match format {
        OutputFormat::Properties => Ok(keyed
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Yaml => {
            if keyed.is_empty() {
                return Ok(String::new());
            }
            serde_yaml::to_string(&keyed).map_err(|source| Error::Encode {
                origin: "list output".to_string(),
                source,
            })
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&keyed)?),
    }
}
