use std::error::Error;

use clap::Parser;
use reposync::{
    cli::args::{CliArgs, Command},
    config::ReposyncConfig,
    Reposync,
};

fn run() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    let config = ReposyncConfig::load()?;

    let mut builder = Reposync::builder();
    if let Some(temp_dir) = config.temp_dir {
        builder = builder.temp_dir(temp_dir);
    }
    if let Some(state_file) = config.state_file {
        builder = builder.state_file(state_file);
    }
    if let Some(git_path) = config.git_path {
        builder = builder.git_path(git_path);
    }
    if let Some(ssh_path) = config.ssh_path {
        builder = builder.ssh_path(ssh_path);
    }
    let reposync = builder.try_build()?;

    match args.cmd {
        Command::Sync(sync) => reposync.get_source(&sync.into_settings()),
        Command::Cleanup { path } => reposync.cleanup(path),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
