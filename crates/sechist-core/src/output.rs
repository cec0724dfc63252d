//! Dataset serialization to the requested output format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::domain::{Dataset, Result};

/// Supported result formats.
///
/// JSON is indented with keys in sorted order. YAML is block style; string
/// values containing line breaks (commit messages) are emitted as literal
/// block scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// File extension used for the output artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format: {other} (expected json or yaml)")),
        }
    }
}

/// Write `dataset` to `path` in the selected format.
pub fn write_dataset(path: &Path, format: OutputFormat, dataset: &Dataset) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, dataset)?,
        OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, dataset)?,
    }
    writer.flush()?;
    Ok(())
}
