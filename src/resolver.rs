//! Cache-first artifact resolution backed by per-project zip archives.
//!
//! # Resolution
//!
//! ```text
//! load_*(project, key)
//!   │
//!   ├─ CacheCheck: <root>/<member> exists?
//!   │     └─ yes → read → decode → stamp LocalFile → done
//!   │
//!   └─ Miss → ArchiveCheck: <root>/<archive>.zip exists?
//!         ├─ no  → ResolveURL (ProjectArchiveMap) → Download → store
//!         └─ yes ─┐
//!                 ▼
//!             Extract member → decode → stamp Archive → done
//! ```
//!
//! Member paths are `<project>/catalogue.json`,
//! `<project>/corpusjson/<key>.json` and `<project>/<glossary>.json`, both in
//! the cache directory and inside the archive.
//!
//! A decode failure on a cache hit is returned as is; the archive is not
//! consulted. Any failure on the miss branch is returned as
//! [`ResolveError::Archive`] wrapping the original error.
//!
//! The project directory and the [`ProjectArchiveMap`] are fetched at most
//! once per resolver and kept until [`Resolver::refresh`].

use serde::de::DeserializeOwned;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::archive_index::{self, ListingCredential};
use crate::binder::{self, ProjectArchiveMap};
use crate::cache_store::CacheStore;
use crate::config::{CacheConfig, Config, RemoteConfig};
use crate::directory;
use crate::error::{ResolveError, Result};
use crate::extractor::Extractor;
use crate::models::{
    archive_file_name, ArchiveIndexEntry, Catalogue, Glossary, GlossaryType, Project, Provenance,
    TextEdition,
};
use crate::traits::ArtifactSource;
use crate::transport::{HttpTransport, Transport};

/// Result of making sure a project archive is in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched from the archive host and written to this path.
    Downloaded(PathBuf),
    /// Already cached at this path, by an earlier call or another caller.
    AlreadyPresent(PathBuf),
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::Downloaded(path) | DownloadOutcome::AlreadyPresent(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            DownloadOutcome::Downloaded(path) | DownloadOutcome::AlreadyPresent(path) => path,
        }
    }
}

/// How a member is pulled out of the archive on a cache miss.
#[derive(Debug, Clone, Copy)]
enum Extraction {
    /// Decode straight from memory; nothing is left in the cache directory.
    InMemory,
    /// Write the member to its cache path first, so later loads hit.
    ToCache,
}

/// Resolves artifacts from the local cache, falling back to project archives.
pub struct Resolver<T: Transport = HttpTransport> {
    transport: T,
    remote: RemoteConfig,
    credential: Option<ListingCredential>,
    store: CacheStore,
    extractor: Extractor,
    project_memo: OnceCell<Vec<Project>>,
    archive_memo: OnceCell<ProjectArchiveMap>,
}

impl Resolver<HttpTransport> {
    /// Build a resolver with an HTTP transport, reading the listing
    /// credential from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.http)?;
        let store = match &config.cache.root {
            Some(root) => CacheStore::open(root)?,
            None => CacheStore::open_default()?,
        };
        Ok(Resolver::new(transport, config.remote.clone(), store)
            .with_extractor(Extractor::new(config.cache.max_member_bytes))
            .with_credential(ListingCredential::from_env(&config.remote)))
    }
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, remote: RemoteConfig, store: CacheStore) -> Self {
        Self {
            transport,
            remote,
            credential: None,
            store,
            extractor: Extractor::new(CacheConfig::default().max_member_bytes),
            project_memo: OnceCell::new(),
            archive_memo: OnceCell::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_credential(mut self, credential: Option<ListingCredential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &CacheStore {
        &self.store
    }

    /// Drop the memoized project directory and archive map. The next call
    /// that needs them fetches both again.
    pub fn refresh(&mut self) {
        self.project_memo = OnceCell::new();
        self.archive_memo = OnceCell::new();
        debug!("Project directory and archive map invalidated");
    }

    fn projects(&self) -> Result<&[Project]> {
        if let Some(projects) = self.project_memo.get() {
            return Ok(projects);
        }
        let fetched = directory::fetch_projects(&self.transport, &self.remote.project_list_url)?;
        Ok(self.project_memo.get_or_init(|| fetched))
    }

    /// Fetch the archive listing. Not memoized.
    pub fn fetch_archive_index(&self) -> Result<Vec<ArchiveIndexEntry>> {
        archive_index::fetch_archive_index(
            &self.transport,
            &self.remote.archive_index_url,
            self.credential.as_ref(),
        )
    }

    /// The project → archive URL map, built on first use.
    pub fn archive_map(&self) -> Result<&ProjectArchiveMap> {
        if let Some(map) = self.archive_memo.get() {
            return Ok(map);
        }
        let projects = self.projects()?;
        let index = self.fetch_archive_index()?;
        let map = binder::bind(projects, &index);
        info!(
            "Bound {} of {} archives to projects",
            map.len(),
            index.len()
        );
        Ok(self.archive_memo.get_or_init(|| map))
    }

    /// Where the archive for `project_path` lives (or would live) in the cache.
    pub fn cached_archive_path(&self, project_path: &str) -> Result<PathBuf> {
        self.store.path_for(&archive_file_name(project_path))
    }

    /// Make sure the archive for `project_path` is cached, downloading it if
    /// needed. An archive that appears in the cache while the download is in
    /// flight counts as [`DownloadOutcome::AlreadyPresent`].
    pub fn download_archive(&self, project_path: &str) -> Result<DownloadOutcome> {
        let name = archive_file_name(project_path);
        if self.store.exists(&name) {
            return Ok(DownloadOutcome::AlreadyPresent(self.store.path_for(&name)?));
        }

        let url = self
            .archive_map()?
            .url_for(project_path)
            .ok_or_else(|| ResolveError::ProjectNotFound(project_path.to_string()))?
            .to_string();

        info!("Downloading {} from {}", name, url);
        let body = self
            .transport
            .get(&url)
            .map_err(|e| ResolveError::DownloadFailed {
                url: url.clone(),
                reason: e.reason,
            })?;

        match self.store.write_bytes(&name, &body) {
            Ok(path) => Ok(DownloadOutcome::Downloaded(path)),
            Err(ResolveError::AlreadyExists(path)) => {
                debug!("{} was cached concurrently, keeping existing copy", name);
                Ok(DownloadOutcome::AlreadyPresent(path))
            }
            Err(e) => Err(e),
        }
    }

    /// Member names inside the project archive, downloading it if needed.
    pub fn archive_members(&self, project_path: &str) -> Result<Vec<String>> {
        let archive = self
            .download_archive(project_path)
            .map_err(ResolveError::into_archive)?
            .into_path();
        self.extractor
            .list_members(&archive)
            .map_err(ResolveError::into_archive)
    }

    fn resolve<R: DeserializeOwned>(
        &self,
        project_path: &str,
        member: &str,
        what: &str,
        extraction: Extraction,
    ) -> Result<(R, Provenance)> {
        let local = self.store.path_for(member)?;

        if self.store.exists(member) {
            debug!("Cache hit: {}", local.display());
            let bytes = self.store.read_bytes(member)?;
            let record = serde_json::from_slice(&bytes).map_err(|e| ResolveError::decode(what, e))?;
            return Ok((record, Provenance::LocalFile(local)));
        }

        debug!("Cache miss: {}", member);
        self.resolve_from_archive(project_path, member, what, extraction, &local)
            .map_err(ResolveError::into_archive)
    }

    fn resolve_from_archive<R: DeserializeOwned>(
        &self,
        project_path: &str,
        member: &str,
        what: &str,
        extraction: Extraction,
        local: &Path,
    ) -> Result<(R, Provenance)> {
        let archive = self.download_archive(project_path)?.into_path();

        let bytes = match extraction {
            Extraction::InMemory => self.extractor.extract_to_memory(member, &archive)?,
            Extraction::ToCache => {
                match self.extractor.extract_to_file(member, &archive, local) {
                    Ok(_) => {}
                    Err(ResolveError::AlreadyExists(_)) => {
                        debug!("{} was extracted concurrently, keeping existing copy", member);
                    }
                    Err(e) => return Err(e),
                }
                self.store.read_bytes(member)?
            }
        };

        let record = serde_json::from_slice(&bytes).map_err(|e| ResolveError::decode(what, e))?;
        Ok((
            record,
            Provenance::Archive {
                archive,
                member: member.to_string(),
            },
        ))
    }
}

impl<T: Transport> ArtifactSource for Resolver<T> {
    fn fetch_projects(&self) -> Result<Vec<Project>> {
        directory::fetch_projects(&self.transport, &self.remote.project_list_url)
    }

    fn oracc_projects(&self) -> Vec<Project> {
        match self.projects() {
            Ok(projects) => projects.to_vec(),
            Err(e) => {
                warn!("Project directory unavailable: {}", e);
                Vec::new()
            }
        }
    }

    fn available_projects(&self) -> Vec<Project> {
        match self.archive_map() {
            Ok(map) => map.projects().cloned().collect(),
            Err(e) => {
                warn!("Archive map unavailable: {}", e);
                Vec::new()
            }
        }
    }

    fn load_catalogue_at(&self, project_path: &str) -> Result<Catalogue> {
        let member = format!("{}/catalogue.json", project_path);
        let (mut catalogue, provenance): (Catalogue, _) =
            self.resolve(project_path, &member, "catalogue", Extraction::InMemory)?;
        catalogue.loaded_from = Some(provenance);
        Ok(catalogue)
    }

    fn load_text_at(&self, project_path: &str, key: &str) -> Result<TextEdition> {
        let member = format!("{}/corpusjson/{}.json", project_path, key);
        let (mut text, provenance): (TextEdition, _) =
            self.resolve(project_path, &member, "text edition", Extraction::InMemory)?;
        text.loaded_from = Some(provenance);
        Ok(text)
    }

    fn load_glossary_at(&self, project_path: &str, glossary: GlossaryType) -> Result<Glossary> {
        let member = format!("{}/{}.json", project_path, glossary.as_str());
        let (mut loaded, provenance): (Glossary, _) =
            self.resolve(project_path, &member, "glossary", Extraction::ToCache)?;
        loaded.loaded_from = Some(provenance);
        Ok(loaded)
    }

    fn set_cache_root(&mut self, root: &Path) -> Result<()> {
        self.store.set_root(root)
    }

    fn clear_cache(&self) -> Result<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use tempfile::TempDir;

    /// Transport that fails every request.
    struct Offline;

    impl Transport for Offline {
        fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
            Err(TransportError::new(url, "offline"))
        }
    }

    fn offline() -> (TempDir, Resolver<Offline>) {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::open(tmp.path()).unwrap();
        (tmp, Resolver::new(Offline, RemoteConfig::default(), store))
    }

    #[test]
    fn cached_catalogue_loads_offline() {
        let (_tmp, resolver) = offline();
        resolver
            .cache()
            .write_bytes("riao/catalogue.json", br#"{"project":"riao","members":{}}"#)
            .unwrap();
        let catalogue = resolver.load_catalogue_at("riao").unwrap();
        assert_eq!(catalogue.project, "riao");
        assert!(matches!(catalogue.loaded_from, Some(Provenance::LocalFile(_))));
    }

    #[test]
    fn corrupt_cached_file_is_not_refetched() {
        let (_tmp, resolver) = offline();
        resolver
            .cache()
            .write_bytes("riao/corpusjson/Q1.json", b"{not json")
            .unwrap();
        let err = resolver.load_text_at("riao", "Q1").unwrap_err();
        assert!(matches!(err, ResolveError::DecodeFailed { .. }));
    }

    #[test]
    fn miss_without_network_is_wrapped() {
        let (_tmp, resolver) = offline();
        let err = resolver.load_catalogue_at("riao").unwrap_err();
        assert!(matches!(err, ResolveError::Archive(_)));
        assert!(matches!(
            err.root_cause(),
            ResolveError::RemoteUnavailable(_)
        ));
    }

    #[test]
    fn views_are_empty_when_offline() {
        let (_tmp, resolver) = offline();
        assert!(resolver.oracc_projects().is_empty());
        assert!(resolver.available_projects().is_empty());
        let mut seen = None;
        resolver
            .get_available_projects(|projects| seen = Some(projects.len()))
            .unwrap();
        assert_eq!(seen, Some(0));
    }

    #[test]
    fn traversal_keys_are_rejected_before_any_lookup() {
        let (_tmp, resolver) = offline();
        let err = resolver.load_text_at("riao", "../../etc/passwd").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPath(_)));
    }

    #[test]
    fn download_outcome_exposes_path() {
        let outcome = DownloadOutcome::AlreadyPresent(PathBuf::from("/c/riao.zip"));
        assert_eq!(outcome.path(), Path::new("/c/riao.zip"));
        assert_eq!(outcome.into_path(), PathBuf::from("/c/riao.zip"));
    }
}
