//! # Run State Storage
//!
//! Draft and final artifact slots plus the per-run manifest.

pub mod store;

pub use store::{
    ArtifactStore, FinalArtifact, ManifestEntry, RunManifest, DRAFT_PLACEHOLDER, MANIFEST_FILE,
};
