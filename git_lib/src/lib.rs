pub mod git;
pub mod repo;
pub mod repo_path;
pub mod repo_url;
