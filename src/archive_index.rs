//! Archive index client.
//!
//! The per-project zip archives are hosted in a repository whose contents
//! listing maps file names to raw download URLs. The listing endpoint is
//! rate limited; an optional credential read from the environment raises the
//! limit.

use serde::Deserialize;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{ResolveError, Result};
use crate::models::ArchiveIndexEntry;
use crate::transport::Transport;

/// Optional credential appended to the listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCredential {
    pub client_id: Option<String>,
    pub secret: String,
}

impl ListingCredential {
    /// Read the credential from the environment variable named in `remote`.
    /// Returns `None` when the variable is unset or empty.
    pub fn from_env(remote: &RemoteConfig) -> Option<Self> {
        let secret = std::env::var(&remote.credential_env).ok()?;
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            client_id: remote.client_id.clone(),
            secret,
        })
    }
}

/// Row of the hosting listing. Directories have no download URL.
#[derive(Debug, Deserialize)]
struct ListingRow {
    name: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// Build the listing URL, adding the credential as query parameters.
pub fn listing_url(base: &str, credential: Option<&ListingCredential>) -> Result<String> {
    let Some(credential) = credential else {
        return Ok(base.to_string());
    };
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| ResolveError::ArchiveListUnavailable(format!("{}: {}", base, e)))?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(id) = &credential.client_id {
            query.append_pair("client_id", id);
        }
        query.append_pair("client_secret", &credential.secret);
    }
    Ok(url.into())
}

/// Fetch the archive listing.
///
/// # Errors
///
/// - [`ResolveError::ArchiveListUnavailable`] on transport failure
/// - [`ResolveError::DecodeFailed`] if the payload is not a listing array
pub fn fetch_archive_index<T: Transport + ?Sized>(
    transport: &T,
    base_url: &str,
    credential: Option<&ListingCredential>,
) -> Result<Vec<ArchiveIndexEntry>> {
    let url = listing_url(base_url, credential)?;
    let body = transport
        .get(&url)
        // The URL may carry the secret; report the base only.
        .map_err(|e| ResolveError::ArchiveListUnavailable(format!("{}: {}", base_url, e.reason)))?;
    let entries = decode_listing(&body)?;
    debug!("Archive index lists {} archives", entries.len());
    Ok(entries)
}

pub(crate) fn decode_listing(body: &[u8]) -> Result<Vec<ArchiveIndexEntry>> {
    let rows: Vec<ListingRow> =
        serde_json::from_slice(body).map_err(|e| ResolveError::decode("archive index", e))?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            row.download_url.map(|download_url| ArchiveIndexEntry {
                name: row.name,
                download_url,
            })
        })
        .collect())
}
