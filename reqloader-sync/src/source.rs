//! Source resolver — turns a [`ManifestSource`] into manifest text.
//!
//! Hosted manifests given as a web "blob view" URL
//! (`https://github.com/<owner>/<repo>/blob/<ref>/<path>`) are rewritten to
//! the raw-content host before fetching. The rewrite is a pure string
//! transformation; no request is made to find the raw URL.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::time::Duration;

use reqloader_core::ManifestSource;

use crate::error::SyncError;

/// Host that serves hosted files' literal bytes.
pub const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";

/// Web front-end hosts whose blob-view pages can be rewritten.
const WEB_HOSTS: &[&str] = &["github.com", "www.github.com"];

const BLOB_SEGMENT: &str = "blob";

/// Rewrite a blob-view URL to its raw-content equivalent.
///
/// Raw-content URLs, URLs on other hosts and URLs without a blob segment
/// after `<owner>/<repo>` come back unchanged (borrowed).
pub fn normalize(reference: &str) -> Cow<'_, str> {
    let Some((scheme, rest)) = reference.split_once("://") else {
        return Cow::Borrowed(reference);
    };
    let (host, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    if host.eq_ignore_ascii_case(RAW_CONTENT_HOST)
        || !WEB_HOSTS.iter().any(|web| host.eq_ignore_ascii_case(web))
    {
        return Cow::Borrowed(reference);
    }

    // "/owner/repo/blob/ref/file" splits into ["", owner, repo, "blob", ...]
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 5 || segments[3] != BLOB_SEGMENT {
        return Cow::Borrowed(reference);
    }

    let raw_path = segments
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != 3)
        .map(|(_, segment)| *segment)
        .collect::<Vec<_>>()
        .join("/");

    Cow::Owned(format!("{scheme}://{RAW_CONTENT_HOST}{raw_path}"))
}

/// Fetches manifest content from local files and HTTP(S) URLs.
#[derive(Clone)]
pub struct SourceResolver {
    agent: ureq::Agent,
}

impl SourceResolver {
    /// Every network request is bounded by `timeout` (connect + read).
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    /// Read the full current text of `source`.
    pub fn fetch(&self, source: &ManifestSource) -> Result<String, SyncError> {
        match source {
            ManifestSource::Local { reference, path } => {
                std::fs::read_to_string(path).map_err(|err| {
                    let reason = match err.kind() {
                        ErrorKind::NotFound => format!("{} does not exist", path.display()),
                        _ => format!("cannot read {}: {err}", path.display()),
                    };
                    unavailable(reference, reason)
                })
            }
            ManifestSource::Remote { url } => self.fetch_remote(url),
        }
    }

    fn fetch_remote(&self, url: &str) -> Result<String, SyncError> {
        let resolved = normalize(url);
        if resolved != url {
            tracing::debug!(from = %url, to = %resolved, "rewrote blob-view URL");
        }

        let response = match self.agent.get(&resolved).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(unavailable(url, format!("HTTP {code} from {resolved}")));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(unavailable(url, transport.to_string()));
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(unavailable(url, format!("HTTP {status} from {resolved}")));
        }

        response
            .into_string()
            .map_err(|err| unavailable(url, format!("failed to read response body: {err}")))
    }
}

fn unavailable(source_ref: &str, reason: String) -> SyncError {
    SyncError::SourceUnavailable {
        source_ref: source_ref.to_string(),
        reason,
    }
}
