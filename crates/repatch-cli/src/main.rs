//! repatch CLI - replays downstream patch commits onto a moving upstream
//! and publishes the result for the build pipeline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use repatch_core::{Orchestrator, RebaseRequest};
use repatch_git::Repository;

mod config;
mod output;
mod report;

use config::Config;

/// Rebase downstream patch commits onto the new upstream tip and publish
/// the result.
#[derive(Parser)]
#[command(name = "repatch", version, about)]
struct Cli {
    /// Path to the local working repository.
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Report the would-be result without pushing (overrides the config file).
    #[arg(long)]
    dry_run: bool,

    /// Print the outcome as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Suppress informational output.
    #[arg(long, short)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet || cli.json);

    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let request = match build_request(&cli) {
        Ok(request) => request,
        Err(e) => {
            output::error(&format!("{e:#}"));
            return report::EXIT_FATAL;
        }
    };

    let repo = match open_repository(&request) {
        Ok(repo) => repo,
        Err(e) => {
            output::error(&format!("{e:#}"));
            return report::EXIT_FATAL;
        }
    };

    output::info(&format!(
        "Rebasing {} onto {}/{}",
        request.patches.branch, request.upstream.name, request.upstream.branch
    ));

    let outcome = Orchestrator::new(&repo, &request).run();
    report::render(&outcome, cli.json);
    report::exit_code(&outcome)
}

fn build_request(cli: &Cli) -> Result<RebaseRequest> {
    let config = Config::load(&cli.config)?;
    let request = config.into_request(cli.repo.clone(), cli.dry_run);
    request.validate()?;
    Ok(request)
}

fn open_repository(request: &RebaseRequest) -> Result<Repository> {
    let repo = Repository::open(&request.repo_path)
        .with_context(|| format!("cannot open repository at {}", request.repo_path.display()))?;
    Ok(repo
        .with_ssh_key(request.ssh_key.clone())
        .with_committer(&request.author.name, &request.author.email))
}
