use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::{
    git::{Git, GitCmdError},
    repo_path::{self, RepoPathError},
    repo_url::RepoUrl,
};

#[derive(Error, Debug)]
pub enum GitRepoError {
    #[error(transparent)]
    Resolve(#[from] RepoPathError),

    #[error("could not create local dir {repo_path}: {source}")]
    CreateDirError {
        repo_path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not clone repository {remote_url} into directory {repo_path}: {source}")]
    CloneError {
        remote_url: String,
        repo_path: String,
        #[source]
        source: GitCmdError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepo {
    /// Directory git was run in; the checkout itself is `parent_path/<name>`.
    pub parent_path: PathBuf,
    pub remote_url: String,
}

impl GitRepo {
    /// Clones `remote_url` under `root` at `<root>/<host>/<path without last segment>`.
    ///
    /// The parent directory is created before git runs and is left in place
    /// when the clone fails.
    pub fn clone_into_tree<O, E>(
        remote_url: &str,
        root: &Path,
        git: &Git,
        stdout: O,
        stderr: E,
    ) -> Result<GitRepo, GitRepoError>
    where
        O: Write + Send,
        E: Write + Send,
    {
        let url = RepoUrl::parse(remote_url).map_err(RepoPathError::from)?;
        let parent_path = repo_path::parent_dir(root, &url);
        log::debug!("cloning {} into {}", remote_url, parent_path.display());

        fs::create_dir_all(&parent_path).map_err(|source| GitRepoError::CreateDirError {
            repo_path: parent_path.display().to_string(),
            source,
        })?;

        git.clone_into(remote_url, &parent_path, stdout, stderr)
            .map_err(|source| GitRepoError::CloneError {
                remote_url: remote_url.to_string(),
                repo_path: parent_path.display().to_string(),
                source,
            })?;

        log::info!("Cloned {} into {}", remote_url, parent_path.display());
        log::debug!("checkout is at {}", parent_path.join(url.name()).display());

        Ok(GitRepo {
            parent_path,
            remote_url: remote_url.to_string(),
        })
    }

    /// Clones every url in order, stopping at the first failure.
    pub fn clone_all<S, O, E>(
        remote_urls: &[S],
        root: &Path,
        git: &Git,
        mut stdout: O,
        mut stderr: E,
    ) -> Result<Vec<GitRepo>, GitRepoError>
    where
        S: AsRef<str>,
        O: Write + Send,
        E: Write + Send,
    {
        let mut repos = Vec::with_capacity(remote_urls.len());
        for remote_url in remote_urls {
            repos.push(GitRepo::clone_into_tree(
                remote_url.as_ref(),
                root,
                git,
                &mut stdout,
                &mut stderr,
            )?);
        }
        Ok(repos)
    }
}
