//! Core data models used throughout the resolver.
//!
//! Projects and archive index entries describe what is available remotely.
//! Catalogues, text editions and glossaries are the decoded artifacts handed
//! back to callers; they keep any fields this crate does not interpret in an
//! `extra` map so nothing in the source JSON is lost.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Label carried by catalogue entries of the CAMS "Geography of Knowledge"
/// corpus, whose project field is not a path.
pub const GKAB_LABEL: &str = "Geography of Knowledge";
/// Canonical path for [`GKAB_LABEL`] entries.
pub const GKAB_PATH: &str = "cams/gkab";

/// An Oracc project as listed by the project directory.
///
/// Equality and hashing cover every field. Maps that need a narrower key use
/// [`Project::path`] explicitly (see [`ProjectArchiveMap`](crate::binder::ProjectArchiveMap)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    /// Relative path to the project root, e.g. `saao/saa13`.
    #[serde(rename = "pathname")]
    pub path: String,
    #[serde(rename = "abbrev")]
    pub abbreviation: String,
    pub name: String,
    /// Project description, usually HTML.
    pub blurb: String,
}

impl Project {
    pub fn new(
        path: impl Into<String>,
        abbreviation: impl Into<String>,
        name: impl Into<String>,
        blurb: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            abbreviation: abbreviation.into(),
            name: name.into(),
            blurb: blurb.into(),
        }
    }

    /// File name of this project's zip archive.
    pub fn archive_file_name(&self) -> String {
        archive_file_name(&self.path)
    }
}

/// `saao/saa13` → `saao-saa13.zip`.
pub fn archive_file_name(project_path: &str) -> String {
    format!("{}.zip", project_path.replace('/', "-"))
}

/// Envelope served by the project directory endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ProjectList {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub kind: String,
    pub projects: Vec<Project>,
}

/// One downloadable archive in the hosting listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveIndexEntry {
    pub name: String,
    pub download_url: String,
}

/// Where a decoded artifact was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// A plain file inside the cache directory.
    LocalFile(PathBuf),
    /// A member of a cached project archive.
    Archive { archive: PathBuf, member: String },
}

impl Provenance {
    /// The local file for [`Provenance::LocalFile`], the archive file for
    /// [`Provenance::Archive`].
    pub fn path(&self) -> &Path {
        match self {
            Provenance::LocalFile(path) => path,
            Provenance::Archive { archive, .. } => archive,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::LocalFile(path) => write!(f, "{}", path.display()),
            Provenance::Archive { archive, member } => {
                write!(f, "{}!{}", archive.display(), member)
            }
        }
    }
}

/// Metadata index of every text in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    pub project: String,
    #[serde(default)]
    pub members: BTreeMap<String, CatalogueEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub loaded_from: Option<Provenance>,
}

impl Catalogue {
    pub fn entry(&self, id: &str) -> Option<&CatalogueEntry> {
        self.members.get(id)
    }
}

/// Catalogue metadata for a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    #[serde(rename = "id_text", alias = "id")]
    pub id: String,
    /// Project label. Usually the project path, but free text for some
    /// corpora.
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogueEntry {
    /// Canonical project path for this entry's label.
    pub fn project_path(&self) -> &str {
        project_path_for_label(&self.project)
    }
}

/// Map a catalogue project label to a project path. Only the CAMS Geography
/// of Knowledge label differs from its path; anything else is returned as is.
pub fn project_path_for_label(label: &str) -> &str {
    if label.contains(GKAB_LABEL) {
        GKAB_PATH
    } else {
        label
    }
}

/// A single text edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEdition {
    #[serde(rename = "textid", default)]
    pub text_id: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub cdl: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub loaded_from: Option<Provenance>,
}

/// A project glossary for one language or subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glossary {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub entries: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub loaded_from: Option<Provenance>,
}

/// Glossaries an Oracc project may publish. The string form is the file
/// stem inside the project archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlossaryType {
    Akkadian,
    Sumerian,
    ProperNouns,
    NeoAssyrian,
    NeoBabylonian,
    StandardBabylonian,
    OldBabylonian,
    MiddleBabylonianPeripheral,
}

impl GlossaryType {
    pub const ALL: [GlossaryType; 8] = [
        GlossaryType::Akkadian,
        GlossaryType::Sumerian,
        GlossaryType::ProperNouns,
        GlossaryType::NeoAssyrian,
        GlossaryType::NeoBabylonian,
        GlossaryType::StandardBabylonian,
        GlossaryType::OldBabylonian,
        GlossaryType::MiddleBabylonianPeripheral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlossaryType::Akkadian => "gloss-akk",
            GlossaryType::Sumerian => "gloss-sux",
            GlossaryType::ProperNouns => "gloss-qpn",
            GlossaryType::NeoAssyrian => "gloss-akk-x-neoass",
            GlossaryType::NeoBabylonian => "gloss-akk-x-neobab",
            GlossaryType::StandardBabylonian => "gloss-akk-x-stdbab",
            GlossaryType::OldBabylonian => "gloss-akk-x-oldbab",
            GlossaryType::MiddleBabylonianPeripheral => "gloss-akk-x-mbperi",
        }
    }
}

impl fmt::Display for GlossaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlossaryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlossaryType::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = GlossaryType::ALL.iter().map(|g| g.as_str()).collect();
                format!("unknown glossary '{}'; expected one of {}", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_file_name_replaces_every_separator() {
        let project = Project::new("saao/saa13", "SAAo/SAA13", "Letters", "");
        assert_eq!(project.archive_file_name(), "saao-saa13.zip");
        assert_eq!(archive_file_name("riao"), "riao.zip");
        assert_eq!(archive_file_name("cams/gkab/sub"), "cams-gkab-sub.zip");
    }

    #[test]
    fn project_decodes_wire_names() {
        let json = r#"{"pathname":"riao","abbrev":"RIAo","name":"Royal Inscriptions","blurb":"<p>x</p>"}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.path, "riao");
        assert_eq!(project.abbreviation, "RIAo");
        assert_eq!(project.blurb, "<p>x</p>");
    }

    #[test]
    fn project_equality_is_structural() {
        let a = Project::new("saao/saa05", "SAAo/SAA05", "Test", "test");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.name = "Renamed".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn gkab_label_maps_to_fixed_path() {
        assert_eq!(
            project_path_for_label("CAMS: Geography of Knowledge Corpus"),
            "cams/gkab"
        );
        assert_eq!(project_path_for_label("saao/saa13"), "saao/saa13");
    }

    #[test]
    fn catalogue_keeps_unknown_fields() {
        let json = r#"{
            "type": "catalogue",
            "project": "saao/saa13",
            "members": {
                "P285574": {"id_text": "P285574", "project": "saao/saa13", "designation": "SAA 13 001", "period": "Neo-Assyrian"}
            }
        }"#;
        let catalogue: Catalogue = serde_json::from_str(json).unwrap();
        assert_eq!(catalogue.project, "saao/saa13");
        assert_eq!(catalogue.extra["type"], "catalogue");
        let entry = catalogue.entry("P285574").unwrap();
        assert_eq!(entry.designation.as_deref(), Some("SAA 13 001"));
        assert_eq!(entry.extra["period"], "Neo-Assyrian");
        assert!(catalogue.loaded_from.is_none());
    }

    #[test]
    fn glossary_type_round_trips_through_str() {
        for g in GlossaryType::ALL {
            assert_eq!(g.as_str().parse::<GlossaryType>().unwrap(), g);
        }
        assert!("gloss-xyz".parse::<GlossaryType>().is_err());
    }

    #[test]
    fn provenance_path_points_at_archive_for_members() {
        let p = Provenance::Archive {
            archive: PathBuf::from("/c/saao-saa13.zip"),
            member: "saao/saa13/catalogue.json".to_string(),
        };
        assert_eq!(p.path(), Path::new("/c/saao-saa13.zip"));
        assert_eq!(p.to_string(), "/c/saao-saa13.zip!saao/saa13/catalogue.json");
    }
}
