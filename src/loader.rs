use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{AnalyzerError, Result};
use crate::model::RawItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Ndjson,
}

impl OutputFormat {
    pub fn from_ndjson(ndjson: bool) -> Self {
        if ndjson {
            OutputFormat::Ndjson
        } else {
            OutputFormat::Json
        }
    }
}

/// Reads collected items: a JSON array, or one item per line.
pub fn load_items(path: &Path) -> Result<Vec<RawItem>> {
    let text = fs::read_to_string(path).map_err(|source| AnalyzerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|source| AnalyzerError::Json {
            path: path.to_path_buf(),
            source,
        });
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<RawItem>(line).map_err(|source| AnalyzerError::JsonLine {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

pub fn save_items<T: Serialize>(items: &[T], path: &Path, format: OutputFormat) -> Result<()> {
    let io_err = |source| AnalyzerError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json_err = |source| AnalyzerError::Json {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);

    match format {
        OutputFormat::Ndjson => {
            for item in items {
                serde_json::to_writer(&mut out, item).map_err(json_err)?;
                out.write_all(b"\n").map_err(io_err)?;
            }
        }
        OutputFormat::Json => {
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
            items.serialize(&mut ser).map_err(json_err)?;
            out.write_all(b"\n").map_err(io_err)?;
        }
    }

    out.flush().map_err(io_err)?;
    info!(count = items.len(), path = %path.display(), "saved items");
    Ok(())
}
