//! Snapshots of a watched output directory and the rules deciding whether
//! a snapshot shows that a job produced its artifact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pattern::FilePattern;
use crate::ports::ArtifactSource;
use crate::types::ArtifactFile;

/// What a directory looked like at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactState {
    /// Number of files matching the pattern.
    pub matched: usize,
    /// Most recently modified match.
    pub newest: Option<ArtifactFile>,
}

impl ArtifactState {
    /// Account for one matching file.
    ///
    /// On equal modification times the file seen first stays newest.
    pub fn observe(&mut self, file: ArtifactFile) {
        self.matched += 1;
        let replace = match &self.newest {
            Some(current) => file.modified > current.modified,
            None => true,
        };
        if replace {
            self.newest = Some(file);
        }
    }

    pub fn newest_path(&self) -> Option<&Path> {
        self.newest.as_ref().map(|f| f.path.as_path())
    }

    pub fn newest_modified(&self) -> Option<DateTime<Utc>> {
        self.newest.as_ref().map(|f| f.modified)
    }
}

/// How a file-watch decides that the job has written its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileWatchPolicy {
    /// The newest matching file was modified after the baseline was taken.
    /// Covers jobs that overwrite a fixed output file in place.
    #[default]
    ModifiedInPlace,
    /// A new file appeared: the match count grew or the newest file changed.
    RequireNewFile,
}

/// A directory to watch and how to judge it.
#[derive(Debug, Clone)]
pub struct ArtifactWatch {
    pub dir: PathBuf,
    pub pattern: FilePattern,
    pub policy: FileWatchPolicy,
}

impl ArtifactWatch {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pattern: FilePattern::default(),
            policy: FileWatchPolicy::default(),
        }
    }

    pub fn with_pattern(mut self, pattern: FilePattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_policy(mut self, policy: FileWatchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Whether `current` has moved past `baseline` under `policy`.
pub fn has_advanced(
    baseline: &ArtifactState,
    current: &ArtifactState,
    policy: FileWatchPolicy,
) -> bool {
    match policy {
        FileWatchPolicy::RequireNewFile => {
            if current.matched > baseline.matched {
                return true;
            }
            match (baseline.newest_path(), current.newest_path()) {
                (Some(before), Some(now)) => before != now,
                (None, Some(_)) => true,
                _ => false,
            }
        }
        FileWatchPolicy::ModifiedInPlace => {
            match (baseline.newest_modified(), current.newest_modified()) {
                (Some(before), Some(now)) => now > before,
                (None, Some(_)) => true,
                _ => false,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DirectoryScanner
// ---------------------------------------------------------------------------

/// [`ArtifactSource`] backed by the local (or mounted network) filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryScanner;

#[async_trait]
impl ArtifactSource for DirectoryScanner {
    async fn snapshot(&self, dir: &Path, pattern: &FilePattern) -> std::io::Result<ArtifactState> {
        let meta = tokio::fs::metadata(dir).await?;
        if !meta.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut state = ArtifactState::default();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !pattern.matches(name) {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Removed between listing and stat.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !meta.is_file() {
                continue;
            }
            state.observe(ArtifactFile {
                path: entry.path(),
                modified: meta.modified()?.into(),
            });
        }
        Ok(state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
