mod cli;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use git_lib::{git::Git, repo::GitRepo, repo_path::RootDir};
use std::{io, process::ExitCode};

use crate::cli::Cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    log::debug!("{:?}", args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<()> {
    if args.repos.is_empty() {
        log::debug!("no repositories given");
        return Ok(());
    }

    let root = RootDir::new(args.git_dir).resolve()?;
    let git = Git::new(args.git_program);

    GitRepo::clone_all(&args.repos, &root, &git, io::stdout(), io::stderr())?;

    Ok(())
}
