//! Joins the project directory to the archive index.
//!
//! The join key is the archive file name derived from the project path
//! (`saao/saa13` → `saao-saa13.zip`). The directory and the archive host are
//! maintained separately, so archives without a project (and projects without
//! an archive) are expected and simply left out.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{ArchiveIndexEntry, Project};

/// A project together with its archive download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundArchive {
    pub project: Project,
    pub download_url: String,
}

/// Project path → archive download URL.
///
/// Keyed on [`Project::path`] rather than on the whole record, so lookups
/// only need the path (which is all a catalogue carries).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectArchiveMap {
    entries: BTreeMap<String, BoundArchive>,
}

impl ProjectArchiveMap {
    pub fn url_for(&self, project_path: &str) -> Option<&str> {
        self.entries
            .get(project_path)
            .map(|bound| bound.download_url.as_str())
    }

    pub fn get(&self, project: &Project) -> Option<&str> {
        self.url_for(&project.path)
    }

    pub fn contains(&self, project_path: &str) -> bool {
        self.entries.contains_key(project_path)
    }

    /// Bound projects in path order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.entries.values().map(|bound| &bound.project)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArchive> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bind every archive index entry to the first project whose archive file
/// name matches it. Unmatched entries are dropped.
pub fn bind(projects: &[Project], archives: &[ArchiveIndexEntry]) -> ProjectArchiveMap {
    let mut entries = BTreeMap::new();
    for archive in archives {
        let Some(project) = projects
            .iter()
            .find(|p| p.archive_file_name() == archive.name)
        else {
            debug!("No project for archive {}", archive.name);
            continue;
        };
        entries.insert(
            project.path.clone(),
            BoundArchive {
                project: project.clone(),
                download_url: archive.download_url.clone(),
            },
        );
    }
    ProjectArchiveMap { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saa13() -> Project {
        Project::new(
            "saao/saa13",
            "SAAo/SAA13",
            "Letters from Assyrian and Babylonian Priests to Kings Esarhaddon and Assurbanipal",
            "The text editions from the book S. W. Cole and P. Machinist.",
        )
    }

    fn entry(name: &str, url: &str) -> ArchiveIndexEntry {
        ArchiveIndexEntry {
            name: name.to_string(),
            download_url: url.to_string(),
        }
    }

    #[test]
    fn binds_project_to_its_archive() {
        let url = "https://raw.githubusercontent.com/oracc/json/master/saao-saa13.zip";
        let map = bind(&[saa13()], &[entry("saao-saa13.zip", url)]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&saa13()), Some(url));
        assert_eq!(map.url_for("saao/saa13"), Some(url));
    }

    #[test]
    fn unmatched_archive_is_dropped() {
        let map = bind(
            &[saa13()],
            &[
                entry("unknown.zip", "https://x/unknown.zip"),
                entry("saao-saa13.zip", "https://x/saao-saa13.zip"),
            ],
        );
        assert_eq!(map.len(), 1);
        assert!(map.contains("saao/saa13"));
        assert!(map.projects().all(|p| p.path != "unknown"));
    }

    #[test]
    fn project_without_archive_is_absent() {
        let riao = Project::new("riao", "RIAo", "Royal Inscriptions", "");
        let map = bind(&[saa13(), riao.clone()], &[entry("saao-saa13.zip", "u")]);
        assert_eq!(map.get(&riao), None);
    }

    #[test]
    fn first_matching_project_wins_on_name_collision() {
        let nested = Project::new("a/b", "A/B", "nested", "");
        let flat = Project::new("a-b", "A-B", "flat", "");
        let map = bind(&[nested.clone(), flat.clone()], &[entry("a-b.zip", "u")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&nested), Some("u"));
        assert_eq!(map.get(&flat), None);
    }

    #[test]
    fn empty_inputs_give_empty_map() {
        assert!(bind(&[], &[entry("saao-saa13.zip", "u")]).is_empty());
        assert!(bind(&[saa13()], &[]).is_empty());
    }
}
