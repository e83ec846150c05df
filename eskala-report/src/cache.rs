use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use chrono::NaiveDate;
use eskala_jira::Issue;
use regex::Regex;
use thiserror::Error;

const SNAPSHOT_PREFIX: &str = "issues_";
const SNAPSHOT_SUFFIX: &str = ".json";
const DATE_TOKEN_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no issue snapshot found in {}", .0.display())]
    NotFound(PathBuf),
    #[error("issue snapshot {} is corrupt", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode issue snapshot")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedSnapshot {
    pub as_of: NaiveDate,
    pub issues: Vec<Issue>,
}

pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> Result<CachedSnapshot, CacheError> {
        let entries = fs::read_dir(&self.dir).map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                CacheError::NotFound(self.dir.clone())
            } else {
                CacheError::Io(error)
            }
        })?;

        let mut snapshot = None;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(as_of) = parse_snapshot_date(name) {
                snapshot = Some((entry.path(), as_of));
                break;
            }
        }

        let Some((path, as_of)) = snapshot else {
            return Err(CacheError::NotFound(self.dir.clone()));
        };

        let payload = fs::read_to_string(&path)?;
        let issues =
            serde_json::from_str(&payload).map_err(|source| CacheError::Corrupt { path, source })?;
        Ok(CachedSnapshot { as_of, issues })
    }

    pub fn save(&self, issues: &[Issue], today: NaiveDate) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir)?;

        let file_name = snapshot_file_name(today);
        let path = self.dir.join(&file_name);
        let payload = serde_json::to_string(issues).map_err(CacheError::Encode)?;
        fs::write(&path, payload)?;

        // the fresh file must be the only one matching the snapshot pattern
        // once save returns; stale snapshots would shadow it on the next load
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name != file_name && parse_snapshot_date(name).is_some() {
                fs::remove_file(entry.path())?;
            }
        }

        Ok(path)
    }
}

fn snapshot_file_name(date: NaiveDate) -> String {
    format!(
        "{SNAPSHOT_PREFIX}{}{SNAPSHOT_SUFFIX}",
        date.format(DATE_TOKEN_FORMAT)
    )
}

fn parse_snapshot_date(file_name: &str) -> Option<NaiveDate> {
    if !file_name.starts_with(SNAPSHOT_PREFIX) || !file_name.ends_with(SNAPSHOT_SUFFIX) {
        return None;
    }
    let token = date_token().find(file_name)?.as_str();
    NaiveDate::parse_from_str(token, DATE_TOKEN_FORMAT).ok()
}

fn date_token() -> &'static Regex {
    static DATE_TOKEN: OnceLock<Regex> = OnceLock::new();
    DATE_TOKEN.get_or_init(|| Regex::new(r"\d{2}-\d{2}-\d{4}").expect("regex"))
}
