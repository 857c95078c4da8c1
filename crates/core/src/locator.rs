//! Menu image lookup.
//!
//! Menu images are published into a single directory and named after the
//! date they cover, conventionally `YYYY-MM-DD_<Wkd>.png` (for example
//! `2026-02-03_Tue.png`). Any `_suffix` is accepted, as are `.jpg` and
//! `.jpeg` files. When several files match one date the lexicographically
//! smallest name wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex_lite::Regex;
use tracing::{debug, trace};

use crate::errors::AttemptError;
use crate::models::MenuImageRef;

fn file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?P<date>\d{4}-\d{2}-\d{2})(?:_.+)?\.(?:png|jpe?g)$")
            .expect("menu image pattern is a valid regex")
    })
}

/// Parse the date out of a menu image file name, if it follows the convention.
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let caps = file_pattern().captures(name)?;
    NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d").ok()
}

/// Resolves menu images for dates inside one directory.
#[derive(Debug, Clone)]
pub struct ImageLocator {
    dir: PathBuf,
}

impl ImageLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The conventional file name for `date`, e.g. `2026-02-03_Tue.png`.
    pub fn expected_file_name(date: NaiveDate) -> String {
        format!("{}_{}.png", date.format("%Y-%m-%d"), date.format("%a"))
    }

    /// List the directory and map every dated image to its path.
    pub async fn index(&self) -> Result<BTreeMap<NaiveDate, PathBuf>, AttemptError> {
        let unavailable = |e: std::io::Error| AttemptError::DirectoryUnavailable {
            path: self.dir.display().to_string(),
            detail: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unavailable)?;
        let mut found: BTreeMap<NaiveDate, PathBuf> = BTreeMap::new();

        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(date) = date_from_file_name(&name) else {
                trace!(file = %name, "ignoring file that does not match the naming convention");
                continue;
            };

            let path = entry.path();
            let keep_existing = found
                .get(&date)
                .and_then(|existing| existing.file_name())
                .is_some_and(|existing| existing.to_string_lossy().as_ref() <= name.as_str());
            if !keep_existing {
                found.insert(date, path);
            }
        }

        debug!(dir = %self.dir.display(), images = found.len(), "scanned menu image directory");
        Ok(found)
    }

    /// Look up the image for `date`. `Ok(None)` means it is not there yet.
    pub async fn locate(&self, date: NaiveDate) -> Result<Option<MenuImageRef>, AttemptError> {
        let mut index = self.index().await?;
        Ok(index.remove(&date).map(|path| MenuImageRef { path, date }))
    }
}
