//! Record sources: reading article files and finding them on disk

use crate::error::ParseError;
use crate::types::Article;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Something that turns one input file into records
pub trait RecordSource {
    /// Read every record in the file, in file order.
    ///
    /// A single malformed record fails the whole file.
    fn read_all(&self, path: &Path) -> Result<Vec<Article>, ParseError>;
}

/// Newline-delimited JSON: one article object per line
#[derive(Debug, Clone, Default)]
pub struct JsonLinesSource;

impl JsonLinesSource {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSource for JsonLinesSource {
    fn read_all(&self, path: &Path) -> Result<Vec<Article>, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut articles = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| ParseError::Read {
                path: path.to_path_buf(),
                source,
            })?;

            // Blank lines (usually a trailing newline) carry no record
            if line.trim().is_empty() {
                continue;
            }

            let article = serde_json::from_str(&line).map_err(|source| ParseError::Record {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })?;
            articles.push(article);
        }

        debug!("Read {} articles from {}", articles.len(), path.display());
        Ok(articles)
    }
}

/// Find all regular files under `dir` whose name ends with `.{extension}`.
///
/// Results are sorted by path so runs are reproducible. Unreadable entries are
/// logged and skipped.
pub fn discover_files(dir: impl AsRef<Path>, extension: &str) -> Vec<PathBuf> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));

    let mut paths: Vec<PathBuf> = WalkDir::new(dir.as_ref())
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(&suffix))
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    paths
}
