//! # Artifact Store
//!
//! File-backed slots for draft and final artifacts. Drafts live in a scratch
//! directory and are left there after the run; finals live in the durable
//! output directory until the next run overwrites them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::{RetryPolicy, StorageConfig};
use crate::error::{PlannerError, PlannerResult};
use crate::pipeline::Category;

/// Written to every draft slot when a run starts.
pub const DRAFT_PLACEHOLDER: &str =
    "# Placeholder content\nThis file will be updated by the AI agent.";

pub const MANIFEST_FILE: &str = "manifest.json";

/// A final document together with its category tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalArtifact {
    pub category: Category,
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub bytes: u64,
    pub placeholder: bool,
}

/// Record of what a run left in the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub entries: BTreeMap<Category, ManifestEntry>,
}

impl RunManifest {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            created_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    pub fn placeholders(&self) -> Vec<Category> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.placeholder)
            .map(|(category, _)| *category)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    draft_dir: PathBuf,
    final_dir: PathBuf,
    retry: RetryPolicy,
}

impl ArtifactStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            draft_dir: config.draft_dir.clone(),
            final_dir: config.final_dir.clone(),
            retry: config.read_retry,
        }
    }

    pub fn draft_dir(&self) -> &Path {
        &self.draft_dir
    }

    pub fn final_dir(&self) -> &Path {
        &self.final_dir
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn draft_path(&self, category: Category) -> PathBuf {
        self.draft_dir.join(category.draft_file_name())
    }

    pub fn final_path(&self, category: Category) -> PathBuf {
        self.final_dir.join(category.final_file_name())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.final_dir.join(MANIFEST_FILE)
    }

    /// Create both directories, seed every draft slot with the placeholder
    /// and remove final artifacts left by a previous run.
    pub async fn prepare_run(&self) -> PlannerResult<()> {
        for dir in [&self.draft_dir, &self.final_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| PlannerError::io(dir, e))?;
        }

        for category in Category::ALL {
            write_file(&self.draft_path(category), DRAFT_PLACEHOLDER).await?;

            let stale = self.final_path(category);
            match fs::remove_file(&stale).await {
                Ok(()) => tracing::debug!(path = %stale.display(), "Removed stale final artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PlannerError::io(&stale, e)),
            }
        }
        Ok(())
    }

    pub async fn write_draft(&self, category: Category, content: &str) -> PlannerResult<()> {
        write_file(&self.draft_path(category), content).await
    }

    /// Read a draft, retrying while the slot is missing or blank.
    pub async fn read_draft(&self, category: Category) -> String {
        self.read_with_retry(&self.draft_path(category), DRAFT_PLACEHOLDER)
            .await
    }

    pub async fn write_final(&self, category: Category, content: &str) -> PlannerResult<FinalArtifact> {
        let path = self.final_path(category);
        write_file(&path, content).await?;
        Ok(FinalArtifact {
            category,
            path,
            content: content.to_string(),
        })
    }

    /// The final artifact, if it exists and is non-blank. Single attempt.
    pub async fn load_final(&self, category: Category) -> Option<FinalArtifact> {
        let path = self.final_path(category);
        let content = fs::read_to_string(&path).await.ok()?;
        if content.trim().is_empty() {
            return None;
        }
        Some(FinalArtifact {
            category,
            path,
            content,
        })
    }

    /// Bounded fixed-delay retry for a just-written file.
    ///
    /// Succeeds only on non-blank content; after the last attempt the
    /// default is returned instead of an error.
    pub async fn read_with_retry(&self, path: &Path, default: &str) -> String {
        for attempt in 1..=self.retry.attempts {
            match fs::read_to_string(path).await {
                Ok(content) if !content.trim().is_empty() => return content,
                Ok(_) => tracing::debug!(path = %path.display(), attempt, "File is empty"),
                Err(e) => tracing::debug!(path = %path.display(), attempt, error = %e, "Read failed"),
            }
            if attempt < self.retry.attempts {
                tokio::time::sleep(self.retry.delay()).await;
            }
        }
        tracing::warn!(
            path = %path.display(),
            attempts = self.retry.attempts,
            "Giving up on read, using default"
        );
        default.to_string()
    }

    pub async fn write_manifest(&self, manifest: &RunManifest) -> PlannerResult<()> {
        let content = serde_json::to_string_pretty(manifest)?;
        write_file(&self.manifest_path(), &content).await
    }

    pub async fn read_manifest(&self) -> PlannerResult<Option<RunManifest>> {
        let path = self.manifest_path();
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PlannerError::io(&path, e)),
        }
    }
}

async fn write_file(path: &Path, content: &str) -> PlannerResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PlannerError::io(parent, e))?;
    }
    fs::write(path, content)
        .await
        .map_err(|e| PlannerError::io(path, e))
}
