use std::{
    borrow::Cow,
    ffi::OsString,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

use crate::repo_url::{RepoUrl, RepoUrlError};

pub const DEFAULT_ROOT_DIR: &str = "~/GIT";

const HOME_PLACEHOLDER: char = '~';

#[derive(Error, Debug)]
pub enum RepoPathError {
    #[error(transparent)]
    MalformedUrl(#[from] RepoUrlError),

    #[error("could not determine the current user's home directory to resolve '~' in {0}")]
    UnresolvableHome(String),
}

/// Template for the directory all repositories are cloned under.
///
/// The first `~` in the template stands for the current user's home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDir {
    template: String,
}

impl Default for RootDir {
    fn default() -> Self {
        RootDir::new(DEFAULT_ROOT_DIR)
    }
}

impl RootDir {
    pub fn new(template: impl Into<String>) -> Self {
        RootDir {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn resolve(&self) -> Result<PathBuf, RepoPathError> {
        self.resolve_with_home(dirs::home_dir())
    }

    pub fn resolve_with_home(&self, home: Option<PathBuf>) -> Result<PathBuf, RepoPathError> {
        let Some((before, after)) = self.template.split_once(HOME_PLACEHOLDER) else {
            return Ok(PathBuf::from(&self.template));
        };
        let home = home.ok_or_else(|| RepoPathError::UnresolvableHome(self.template.clone()))?;

        let mut resolved = OsString::from(before);
        resolved.push(home.as_os_str());
        resolved.push(after);

        log::debug!("resolved root dir {} to {:?}", self.template, resolved);
        Ok(PathBuf::from(resolved))
    }
}

/// Directory that `git clone <identifier>` should run in.
pub fn resolve(identifier: &str, root: &RootDir) -> Result<PathBuf, RepoPathError> {
    resolve_with_home(identifier, root, dirs::home_dir())
}

pub fn resolve_with_home(
    identifier: &str,
    root: &RootDir,
    home: Option<PathBuf>,
) -> Result<PathBuf, RepoPathError> {
    let url = RepoUrl::parse(identifier)?;
    let root = root.resolve_with_home(home)?;
    Ok(parent_dir(&root, &url))
}

/// `root/host/<url path without its last segment>`, lexically cleaned.
///
/// The url path is percent-decoded and cleaned on its own, so it always stays
/// below `root/host`.
pub fn parent_dir(root: &Path, url: &RepoUrl) -> PathBuf {
    let parent = url.parent_path();
    let decoded = urlencoding::decode(parent).unwrap_or(Cow::Borrowed(parent));
    let mut dir = clean(&root.join(&url.host));
    dir.extend(clean_rooted(&decoded));
    dir
}

/// Segments of a `/`-separated path cleaned as if it were rooted, so `..`
/// at the top is dropped.
fn clean_rooted(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    segments
}

fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(Component::ParentDir),
            },
            other => cleaned.push(other),
        }
    }
    cleaned
}
