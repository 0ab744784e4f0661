use thiserror::Error;
use url::Url;

/// The only host whose scp-like `host:path` form gets rewritten to `host/path`.
const SCP_HOST: &str = "github.com:";
const SCP_HOST_REWRITE: &str = "github.com/";

/// Scheme assumed for identifiers that have none after the rewrite.
const IMPLIED_SCHEME: &str = "ssh";

#[derive(Error, Debug)]
pub enum RepoUrlError {
    #[error("could not parse repo url {identifier}: {source}")]
    Parse {
        identifier: String,
        #[source]
        source: url::ParseError,
    },

    #[error("could not parse repo url {0}: no host")]
    MissingHost(String),

    #[error("could not parse repo url {0}: no repository path")]
    MissingPath(String),
}

/// A repository identifier split into the pieces the local layout is built from.
///
/// `host` (with its port, if any) and `path` are taken verbatim from the
/// identifier, so their case and encoding are exactly what the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub identifier: String,
    pub host: String,
    pub path: String,
}

impl RepoUrl {
    pub fn parse(identifier: &str) -> Result<RepoUrl, RepoUrlError> {
        let normalized = normalize(identifier);
        let with_scheme = if has_scheme(&normalized) {
            normalized
        } else {
            format!("{IMPLIED_SCHEME}://{normalized}")
        };
        log::debug!("normalized {identifier} to {with_scheme}");

        // Only used for validation. The parsed url lowercases special-scheme
        // hosts and percent-encodes paths.
        Url::parse(&with_scheme).map_err(|source| RepoUrlError::Parse {
            identifier: identifier.to_string(),
            source,
        })?;

        let (host, path) = split_host_path(&with_scheme);
        if host.is_empty() || host == "." || host == ".." {
            return Err(RepoUrlError::MissingHost(identifier.to_string()));
        }
        if path.trim_matches('/').is_empty() {
            return Err(RepoUrlError::MissingPath(identifier.to_string()));
        }

        Ok(RepoUrl {
            identifier: identifier.to_string(),
            host: host.to_string(),
            path: path.to_string(),
        })
    }

    /// The path without its final segment, which git creates itself.
    pub fn parent_path(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rfind('/').map_or("", |idx| &trimmed[..idx])
    }

    /// Final path segment, the name of the directory git will clone into.
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
        name.strip_suffix(".git").unwrap_or(name)
    }
}

pub fn normalize(identifier: &str) -> String {
    identifier.replacen(SCP_HOST, SCP_HOST_REWRITE, 1)
}

fn has_scheme(candidate: &str) -> bool {
    let Some((scheme, _)) = candidate.split_once("://") else {
        return false;
    };
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Splits `scheme://[user@]host[:port]/path[?query][#fragment]` into `host[:port]` and path.
fn split_host_path(url: &str) -> (&str, &str) {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority_end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let path_end = tail.find(|c: char| matches!(c, '?' | '#')).unwrap_or(tail.len());

    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    (host, &tail[..path_end])
}
