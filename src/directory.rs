//! Project directory client.
//!
//! Fetches the list of every project hosted on Oracc. The endpoint wraps the
//! list in a small envelope (`{"type": ..., "projects": [...]}`); only the
//! inner array is returned.

use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::models::{Project, ProjectList};
use crate::transport::Transport;

/// Fetch and decode the project directory at `url`.
///
/// # Errors
///
/// - [`ResolveError::RemoteUnavailable`] if the endpoint cannot be reached
/// - [`ResolveError::DecodeFailed`] if the payload is not a project list
pub fn fetch_projects<T: Transport + ?Sized>(transport: &T, url: &str) -> Result<Vec<Project>> {
    let body = transport
        .get(url)
        .map_err(|e| ResolveError::RemoteUnavailable(e.to_string()))?;
    let projects = decode_projects(&body)?;
    debug!("Project directory lists {} projects", projects.len());
    Ok(projects)
}

pub(crate) fn decode_projects(body: &[u8]) -> Result<Vec<Project>> {
    let list: ProjectList =
        serde_json::from_slice(body).map_err(|e| ResolveError::decode("project list", e))?;
    Ok(list.projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    struct Fixed(std::result::Result<Vec<u8>, TransportError>);

    impl Transport for Fixed {
        fn get(&self, _url: &str) -> std::result::Result<Vec<u8>, TransportError> {
            self.0.clone()
        }
    }

    #[test]
    fn decodes_inner_project_array() {
        let body = br#"{"type":"projectlist","projects":[
            {"pathname":"saao/saa13","abbrev":"SAAo/SAA13","name":"Letters from Priests","blurb":"<a href=\"x\">Buy</a>"},
            {"pathname":"riao","abbrev":"RIAo","name":"Royal Inscriptions of Assyria online","blurb":""}
        ]}"#;
        let projects = fetch_projects(&Fixed(Ok(body.to_vec())), "http://dir").unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].path, "saao/saa13");
        assert_eq!(projects[1].abbreviation, "RIAo");
    }

    #[test]
    fn unreachable_directory_is_remote_unavailable() {
        let err = fetch_projects(
            &Fixed(Err(TransportError::new("http://dir", "connection refused"))),
            "http://dir",
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::RemoteUnavailable(_)));
    }

    #[test]
    fn bare_array_is_a_decode_failure() {
        let body = br#"[{"pathname":"riao","abbrev":"RIAo","name":"n","blurb":"b"}]"#;
        let err = fetch_projects(&Fixed(Ok(body.to_vec())), "http://dir").unwrap_err();
        assert!(matches!(err, ResolveError::DecodeFailed { .. }));
    }
}
