//! Direct-to-site artifact source.
//!
//! The live Oracc site only serves JSON for a single project, so this source
//! handles exactly that project's catalogue and texts. It keeps no cache and
//! never touches archives; everything else fails with
//! [`ResolveError::Unimplemented`].

use std::cell::OnceCell;
use std::path::Path;
use tracing::warn;

use crate::config::{Config, DirectConfig, RemoteConfig};
use crate::directory;
use crate::error::{ResolveError, Result};
use crate::models::{Catalogue, Glossary, GlossaryType, Project, TextEdition};
use crate::traits::ArtifactSource;
use crate::transport::{HttpTransport, Transport};

pub struct DirectSiteResolver<T: Transport = HttpTransport> {
    transport: T,
    remote: RemoteConfig,
    direct: DirectConfig,
    project_memo: OnceCell<Vec<Project>>,
}

impl DirectSiteResolver<HttpTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.http)?;
        Ok(Self::new(
            transport,
            config.remote.clone(),
            config.direct.clone(),
        ))
    }
}

impl<T: Transport> DirectSiteResolver<T> {
    pub fn new(transport: T, remote: RemoteConfig, direct: DirectConfig) -> Self {
        warn!(
            "The Oracc site serves JSON for {} only; other projects are unavailable",
            direct.project
        );
        Self {
            transport,
            remote,
            direct,
            project_memo: OnceCell::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn site_url(&self, project_path: &str, rest: &str) -> String {
        format!(
            "{}/{}/{}",
            self.direct.site_url.trim_end_matches('/'),
            project_path.trim_matches('/'),
            rest
        )
    }

    fn is_served(&self, project_path: &str) -> bool {
        project_path.trim_matches('/') == self.direct.project.trim_matches('/')
    }

    fn projects(&self) -> Result<&[Project]> {
        if let Some(projects) = self.project_memo.get() {
            return Ok(projects);
        }
        let fetched = directory::fetch_projects(&self.transport, &self.remote.project_list_url)?;
        Ok(self.project_memo.get_or_init(|| fetched))
    }
}

impl<T: Transport> ArtifactSource for DirectSiteResolver<T> {
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
        self.oracc_projects()
    }

    fn load_catalogue_at(&self, project_path: &str) -> Result<Catalogue> {
        if !self.is_served(project_path) {
            return Err(ResolveError::Unimplemented(
                "Oracc.org isn't serving JSON catalogues right now".to_string(),
            ));
        }
        let url = self.site_url(project_path, "catalogue.json");
        let body = self
            .transport
            .get(&url)
            .map_err(|e| ResolveError::RemoteUnavailable(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ResolveError::decode("catalogue", e))
    }

    fn load_text_at(&self, project_path: &str, key: &str) -> Result<TextEdition> {
        let unavailable =
            || ResolveError::Unimplemented("Oracc.org isn't serving JSON texts right now".to_string());
        if !self.is_served(project_path) {
            return Err(unavailable());
        }
        let url = self.site_url(project_path, &format!("corpusjson/{}.json", key));
        let body = self.transport.get(&url).map_err(|_| unavailable())?;
        serde_json::from_slice(&body).map_err(|e| ResolveError::decode("text edition", e))
    }

    fn load_glossary_at(&self, _project_path: &str, _glossary: GlossaryType) -> Result<Glossary> {
        Err(ResolveError::Unimplemented(
            "Oracc doesn't provide glossaries right now".to_string(),
        ))
    }

    fn set_cache_root(&mut self, _root: &Path) -> Result<()> {
        Err(ResolveError::Unimplemented(
            "the direct-site source keeps no cache".to_string(),
        ))
    }

    fn clear_cache(&self) -> Result<()> {
        Err(ResolveError::Unimplemented(
            "the direct-site source keeps no cache".to_string(),
        ))
    }
}
