//! # Result Bundler
//!
//! Guarantees four renderable documents after a run and packages them into a
//! single zip archive for download.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use serde::Serialize;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PlannerResult;
use crate::pipeline::Category;
use crate::state::{ArtifactStore, ManifestEntry, RunManifest};

/// Document written in place of a missing or empty final artifact.
pub fn placeholder_text(category: Category) -> String {
    format!(
        "# {}\n\nSorry, there was an issue generating this content. \
         Please try again or adjust your parameters.",
        category.title()
    )
}

/// Category to final artifact location, every expected category present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub run_id: String,
    pub artifacts: BTreeMap<Category, PathBuf>,
    /// Categories whose document is a placeholder
    pub placeholders: Vec<Category>,
}

impl RunResult {
    pub fn is_placeholder(&self, category: Category) -> bool {
        self.placeholders.contains(&category)
    }

    /// Load every document for presentation, falling back to a
    /// "will be displayed here" notice if a file cannot be read.
    pub async fn documents(&self, store: &ArtifactStore) -> BTreeMap<Category, String> {
        let mut documents = BTreeMap::new();
        for (category, path) in &self.artifacts {
            let content = store
                .read_with_retry(path, &category.pending_notice())
                .await;
            documents.insert(*category, content);
        }
        documents
    }
}

pub struct ResultBundler;

impl ResultBundler {
    /// Make sure every category has a non-empty final artifact, writing
    /// placeholders where needed, and record the run manifest.
    pub async fn finalize(
        store: &ArtifactStore,
        categories: &[Category],
        run_id: &str,
    ) -> PlannerResult<RunResult> {
        let mut manifest = RunManifest::new(run_id);
        let mut artifacts = BTreeMap::new();
        let mut placeholders = Vec::new();

        for &category in categories {
            let artifact = match store.load_final(category).await {
                Some(artifact) => artifact,
                None => {
                    tracing::warn!(category = %category, "Final artifact missing or empty, writing placeholder");
                    placeholders.push(category);
                    store
                        .write_final(category, &placeholder_text(category))
                        .await?
                }
            };

            manifest.entries.insert(
                category,
                ManifestEntry {
                    file: category.final_file_name(),
                    bytes: artifact.content.len() as u64,
                    placeholder: placeholders.contains(&category),
                },
            );
            artifacts.insert(category, artifact.path);
        }

        store.write_manifest(&manifest).await?;

        Ok(RunResult {
            run_id: run_id.to_string(),
            artifacts,
            placeholders,
        })
    }

    /// Zip every final artifact as `<key>.md`. Unreadable files are skipped.
    pub async fn package(result: &RunResult) -> PlannerResult<Vec<u8>> {
        let mut entries = Vec::with_capacity(result.artifacts.len());
        for (category, path) in &result.artifacts {
            match tokio::fs::read(path).await {
                Ok(bytes) => entries.push((format!("{}.md", category.key()), bytes)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable artifact")
                }
            }
        }
        Self::pack(&entries)
    }

    fn pack(entries: &[(String, Vec<u8>)]) -> PlannerResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes).map_err(ZipError::from)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Entry name to bytes.
    pub fn unpack(archive: &[u8]) -> PlannerResult<BTreeMap<String, Vec<u8>>> {
        let mut archive = ZipArchive::new(Cursor::new(archive))?;
        let mut entries = BTreeMap::new();
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let name = file.name().to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes).map_err(ZipError::from)?;
            entries.insert(name, bytes);
        }
        Ok(entries)
    }
}
