//! The caller-facing contract shared by every artifact source.
//!
//! Two implementations exist:
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │          Resolver            │   │     DirectSiteResolver       │
//! │  cache → archive → download  │   │  live site, one project,     │
//! │  every project, glossaries   │   │  no cache, no glossaries     │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                └───────────────┬──────────────────┘
//!                                ▼
//!                         ArtifactSource
//! ```
//!
//! All operations block the calling thread for the full duration of any
//! network and filesystem work. Callers that need responsiveness run them on
//! a worker thread of their own.

use std::path::Path;

use crate::error::Result;
use crate::models::{Catalogue, CatalogueEntry, Glossary, GlossaryType, Project, TextEdition};

/// Load catalogues, texts and glossaries by project and key.
pub trait ArtifactSource {
    /// Fetch the project directory from the network. Not memoized.
    fn fetch_projects(&self) -> Result<Vec<Project>>;

    /// Every project in the directory, fetched once per instance. Empty if
    /// the directory cannot be fetched.
    fn oracc_projects(&self) -> Vec<Project>;

    /// Projects this source can actually load. Empty on failure.
    fn available_projects(&self) -> Vec<Project>;

    /// Callback form of [`available_projects`](ArtifactSource::available_projects).
    fn get_available_projects<F>(&self, completion: F) -> Result<()>
    where
        F: FnOnce(Vec<Project>),
        Self: Sized,
    {
        completion(self.available_projects());
        Ok(())
    }

    /// Load the catalogue of the project at `project_path`.
    fn load_catalogue_at(&self, project_path: &str) -> Result<Catalogue>;

    /// Load text `key` of the project at `project_path`.
    fn load_text_at(&self, project_path: &str, key: &str) -> Result<TextEdition>;

    /// Load a glossary of the project at `project_path`.
    fn load_glossary_at(&self, project_path: &str, glossary: GlossaryType) -> Result<Glossary>;

    fn load_catalogue(&self, project: &Project) -> Result<Catalogue> {
        self.load_catalogue_at(&project.path)
    }

    /// Load text `key` from the project the catalogue belongs to.
    fn load_text(&self, key: &str, catalogue: &Catalogue) -> Result<TextEdition> {
        self.load_text_at(&catalogue.project, key)
    }

    /// Load the text a catalogue entry describes. The entry's project label
    /// is mapped to a project path first (see
    /// [`project_path_for_label`](crate::models::project_path_for_label)).
    fn load_text_for_entry(&self, entry: &CatalogueEntry) -> Result<TextEdition> {
        self.load_text_at(entry.project_path(), &entry.id)
    }

    fn load_glossary(&self, glossary: GlossaryType, catalogue: &Catalogue) -> Result<Glossary> {
        self.load_glossary_at(&catalogue.project, glossary)
    }

    fn load_glossary_for_entry(
        &self,
        glossary: GlossaryType,
        entry: &CatalogueEntry,
    ) -> Result<Glossary> {
        self.load_glossary_at(entry.project_path(), glossary)
    }

    /// Move the cache to another existing directory.
    fn set_cache_root(&mut self, root: &Path) -> Result<()>;

    /// Delete everything cached.
    fn clear_cache(&self) -> Result<()>;
}
