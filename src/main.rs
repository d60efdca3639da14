mod app;
mod config;
mod describe;
mod llm;
mod output;
mod pr;

use clap::Parser;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// PR Describer: fetches a GitHub Pull Request diff and asks an LLM to write
/// a Markdown description for it.
#[derive(Parser, Debug)]
#[command(name = "pr-describer", version, about)]
struct Cli {
    /// Pull request number or URL (e.g., 42 or https://github.com/org/repo/pull/42)
    ///
    /// Prompted for on stdin when omitted. A bare number refers to the
    /// repository named by the OWNER and REPO variables. Only github.com URLs
    /// are recognised; for GitHub Enterprise pass the number instead.
    pr: Option<String>,

    /// Env file to load variables from (default: .env, skipped if absent)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Settings file (default: .pr-describer.toml, skipped if absent)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep going with an empty diff when the diff can't be fetched
    #[arg(long)]
    allow_empty_diff: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = match config::Config::load(cli.env_file.as_deref(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return fail("Error loading configuration", &err),
    };

    let clients = match app::setup_clients(&config) {
        Ok(clients) => clients,
        Err(err) => return fail("Error setting up clients", &err),
    };

    let pr_ref = match cli.pr.as_deref() {
        Some(input) => pr::parse_pr_ref(input),
        None => pr::prompt_pr_ref(std::io::stdin().lock(), std::io::stdout()),
    };
    let pr_ref = match pr_ref {
        Ok(pr_ref) => pr_ref,
        Err(err) => return fail("Error reading PR number", &err),
    };

    let default_repo = pr::RepoCoordinates::new(&config.owner, &config.repo);
    let request = app::DescribeRequest {
        repo: pr_ref.resolve_repo(&default_repo),
        number: pr_ref.number,
        allow_empty_diff: cli.allow_empty_diff,
    };
    if !request.repo.is_complete() {
        warn!(repo = %request.repo, "OWNER or REPO is not set; the GitHub request will likely fail");
    }
    debug!(repo = %request.repo, pr = request.number, "resolved pull request");

    match app::run(&request, &clients.github, &clients.generator).await {
        Ok(description) => {
            if let Err(err) = output::print_description(&description) {
                error!(error = %err, "failed to write description to stdout");
                return ExitCode::FAILURE;
            }
            info!("done");
            ExitCode::SUCCESS
        }
        Err(err) => fail(err.context(), &err),
    }
}

/// Print a failure on stdout and pick the exit code for it.
fn fail(context: &str, err: &dyn Display) -> ExitCode {
    if let Err(io_err) = output::print_error(context, err) {
        error!(error = %io_err, "failed to write error to stdout");
    }
    ExitCode::FAILURE
}
