use clap::Parser;
use git_lib::{git::DEFAULT_GIT_PROGRAM, repo_path::DEFAULT_ROOT_DIR};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Clones git repositories into a directory tree that mirrors their urls"
)]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "GCLONE_GIT_DIR",
        default_value = DEFAULT_ROOT_DIR,
        help = "Sets the root directory for all git repositories, '~' is replaced with your home directory"
    )]
    pub git_dir: String,

    #[arg(
        long = "git",
        env = "GCLONE_GIT",
        default_value = DEFAULT_GIT_PROGRAM,
        help = "Git executable used to clone"
    )]
    pub git_program: PathBuf,

    #[arg(help = "Repository urls, or github.com:owner/repo shorthand")]
    pub repos: Vec<String>,
}
