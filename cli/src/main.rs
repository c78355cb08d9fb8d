//! CLI for module-migration.
//!
//! Migrates Go module paths and git remote URLs across every repository below
//! a root directory, based on a mapping file of old to new URLs.

use clap::{Args, Parser, Subcommand, ValueEnum};
use module_migration::{
    Bump, ConfigError, MigrationConfig, ProcessingResult, RepositoryReport, RunSummary, Runner,
    RunnerConfig, RunnerError, TouchedFiles, DEFAULT_BRANCH,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Module Migration - Move Go modules and git remotes to new URLs in bulk.
#[derive(Parser, Debug)]
#[command(name = "module-migration", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Migrate every Go module repository: go.mod, sources, build, remote and branch.
    Migrate(RunArgs),
    /// Reconcile remotes and commit pending changes of every git repository.
    Commit(RunArgs),
    /// Replace old module paths and URLs in every file below the root.
    Rewrite(RunArgs),
    /// Tag the next version on the default branch of every git repository.
    Release(ReleaseArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Root directory searched for repositories.
    root: PathBuf,

    /// TOML file with default options.
    #[arg(long, env = "MODULE_MIGRATION_CONFIG")]
    config: Option<PathBuf>,

    /// Name of the remote to reconcile [default: origin].
    #[arg(short, long, env = "MODULE_MIGRATION_REMOTE")]
    remote: Option<String>,

    /// Maximum number of repositories processed at once [default: unbounded].
    #[arg(long, env = "MODULE_MIGRATION_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Only report what would be done.
    #[arg(long, env = "MODULE_MIGRATION_DRY_RUN")]
    dry_run: bool,

    /// Print the run summary as JSON.
    #[arg(long, env = "MODULE_MIGRATION_JSON")]
    json: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Mapping file of old to new repository URLs [default: ./mapping.csv].
    #[arg(short, long, env = "MODULE_MIGRATION_CSV")]
    csv: Option<PathBuf>,

    /// Column separator of the mapping file [default: ;].
    #[arg(short, long, env = "MODULE_MIGRATION_SEPARATOR")]
    separator: Option<String>,

    /// Column of the old URLs, by index or header name [default: 0].
    #[arg(short, long, env = "MODULE_MIGRATION_OLD")]
    old: Option<String>,

    /// Column of the new URLs, by index or header name [default: 1].
    #[arg(short, long, env = "MODULE_MIGRATION_NEW")]
    new: Option<String>,

    /// Branch to commit on. Empty only reconciles remote URLs.
    #[arg(short, long, env = "MODULE_MIGRATION_BRANCH")]
    branch: Option<String>,

    /// Comma-separated regexes of files to rewrite.
    #[arg(short, long, env = "MODULE_MIGRATION_INCLUDE", value_delimiter = ',')]
    include: Option<Vec<String>>,

    /// Comma-separated regexes of paths never to rewrite.
    #[arg(short, long, env = "MODULE_MIGRATION_EXCLUDE", value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Comma-separated files or directories copied into every repository.
    #[arg(long, env = "MODULE_MIGRATION_COPY", value_delimiter = ',')]
    copy: Option<Vec<PathBuf>>,

    /// Commit message and change request title.
    #[arg(long, env = "MODULE_MIGRATION_COMMIT_MESSAGE")]
    commit_message: Option<String>,
}

#[derive(Args, Debug)]
struct ReleaseArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Version component to increment [default: patch].
    #[arg(long, value_enum, env = "MODULE_MIGRATION_BUMP")]
    bump: Option<BumpArg>,

    /// Push tags after creating the new one.
    #[arg(long, env = "MODULE_MIGRATION_PUSH")]
    push: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BumpArg {
    Major,
    Minor,
    Patch,
}

impl From<BumpArg> for Bump {
    fn from(value: BumpArg) -> Self {
        match value {
            BumpArg::Major => Bump::Major,
            BumpArg::Minor => Bump::Minor,
            BumpArg::Patch => Bump::Patch,
        }
    }
}

/// What a subcommand produced.
enum Report {
    Summary(RunSummary),
    Rewrite {
        touched: TouchedFiles,
        commit: Option<RunSummary>,
    },
}

impl Report {
    fn summary(&self) -> Option<&RunSummary> {
        match self {
            Report::Summary(summary) => Some(summary),
            Report::Rewrite { commit, .. } => commit.as_ref(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let json = match &cli.command {
        Command::Migrate(args) | Command::Commit(args) | Command::Rewrite(args) => {
            args.common.json
        }
        Command::Release(args) => args.common.json,
    };

    match run(cli.command).await {
        Ok(report) => {
            if json {
                print_json(&report);
            } else {
                print_report(&report);
            }
            if let Some(summary) = report.summary() {
                if summary.all_success() {
                    info!(repositories = summary.succeeded, "All repositories processed");
                } else if summary.has_failures() {
                    warn!(failed = summary.failed, "Some repositories failed");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(1)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Logs go to stderr so stdout only carries the summary. The level is taken
/// from `RUST_LOG` and falls back to `info`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(command: Command) -> Result<Report, RunnerError> {
    match command {
        Command::Migrate(args) => {
            let mut config = args.resolve()?;
            if config.branch.is_none() {
                config.branch = Some(DEFAULT_BRANCH.to_string());
            }
            let settings = config.validate()?;
            let runner = build_runner(&args.common, settings.concurrency);
            Ok(Report::Summary(runner.migrate(&settings).await?))
        }
        Command::Commit(args) => {
            let settings = args.resolve()?.validate()?;
            let runner = build_runner(&args.common, settings.concurrency);
            Ok(Report::Summary(runner.commit(&settings).await?))
        }
        Command::Rewrite(args) => {
            let settings = args.resolve()?.validate()?;
            let runner = build_runner(&args.common, settings.concurrency);
            let touched = runner.rewrite(&settings).await?;
            let commit = if settings.branch.is_some() {
                Some(runner.commit(&settings).await?)
            } else {
                None
            };
            Ok(Report::Rewrite { touched, commit })
        }
        Command::Release(args) => {
            let mut config = load_config(args.common.config.as_deref())?;
            args.common.apply(&mut config);
            if let Some(bump) = args.bump {
                config.bump = bump.into();
            }
            if args.push {
                config.push = true;
            }
            let (settings, concurrency) = config.validate_release()?;
            let runner = build_runner(&args.common, concurrency);
            Ok(Report::Summary(runner.release(&settings).await?))
        }
    }
}

/// Builds a runner that is interrupted by Ctrl-C.
fn build_runner(common: &CommonArgs, concurrency: Option<usize>) -> Runner {
    let runner = Runner::new(RunnerConfig::new(
        common.root.clone(),
        common.dry_run,
        concurrency,
    ));

    let token = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for running commands to finish");
            token.cancel();
        }
    });

    runner
}

fn load_config(path: Option<&Path>) -> Result<MigrationConfig, ConfigError> {
    match path {
        Some(path) => MigrationConfig::load(path),
        None => Ok(MigrationConfig::default()),
    }
}

impl CommonArgs {
    fn apply(&self, config: &mut MigrationConfig) {
        if let Some(remote) = &self.remote {
            config.remote.clone_from(remote);
        }
        if self.concurrency.is_some() {
            config.concurrency = self.concurrency;
        }
    }
}

impl RunArgs {
    /// Layers the command line flags over the config file.
    fn resolve(&self) -> Result<MigrationConfig, ConfigError> {
        let mut config = load_config(self.common.config.as_deref())?;
        self.common.apply(&mut config);

        if let Some(csv) = &self.csv {
            config.csv.clone_from(csv);
        }
        if let Some(separator) = &self.separator {
            config.separator.clone_from(separator);
        }
        if let Some(old) = &self.old {
            config.old.clone_from(old);
        }
        if let Some(new) = &self.new {
            config.new.clone_from(new);
        }
        if self.branch.is_some() {
            config.branch.clone_from(&self.branch);
        }
        if let Some(include) = &self.include {
            config.include.clone_from(include);
        }
        if let Some(exclude) = &self.exclude {
            config.exclude.clone_from(exclude);
        }
        if let Some(copy) = &self.copy {
            config.copy.clone_from(copy);
        }
        if let Some(message) = &self.commit_message {
            config.commit_message.clone_from(message);
        }
        Ok(config)
    }
}

fn print_json(report: &Report) {
    let rendered = match report {
        Report::Summary(summary) => serde_json::to_string_pretty(summary),
        Report::Rewrite { touched, commit } => serde_json::to_string_pretty(&serde_json::json!({
            "touched_files": touched,
            "commit": commit,
        })),
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to serialize summary"),
    }
}

fn print_report(report: &Report) {
    match report {
        Report::Summary(summary) => print_summary(summary),
        Report::Rewrite { touched, commit } => {
            for path in touched {
                println!("{}", path.display());
            }
            if let Some(summary) = commit {
                print_summary(summary);
            }
        }
    }
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!(
        "  Repositories discovered: {}",
        summary.repositories_discovered
    );
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Skipped: {}", summary.skipped);
    println!("  Failed: {}", summary.failed);

    if !summary.dry_run {
        println!("  Files touched: {}", summary.files_touched);
        println!("  Branches pushed: {}", summary.pushed);
        println!("  Nothing to commit: {}", summary.nothing_to_commit);
        println!("  Change requests opened: {}", summary.change_requests_opened);
        println!("  Change requests failed: {}", summary.change_requests_failed);
        println!("  Releases created: {}", summary.releases_created);
    }

    if summary.results.is_empty() {
        return;
    }
    println!("\nRepositories:");
    for result in &summary.results {
        match result {
            ProcessingResult::Success { repository, report } => {
                println!("  ok    {repository}: {}", describe(report));
            }
            ProcessingResult::Skipped { repository, reason } => {
                println!("  skip  {repository}: {reason}");
            }
            ProcessingResult::Failed { repository, error } => {
                println!("  FAIL  {repository}: {error}");
            }
        }
    }
}

fn describe(report: &RepositoryReport) -> String {
    if let Some(release) = &report.release {
        return format!("tagged {} on {}", release.tag, release.branch);
    }
    let mut parts = Vec::new();
    if let Some((old, new)) = &report.module_rename {
        parts.push(format!("module {old} -> {new}"));
    }
    if !report.touched_files.is_empty() {
        parts.push(format!("{} files rewritten", report.touched_files.len()));
    }
    if let Some(outcome) = &report.outcome {
        parts.push(outcome.describe());
    }
    if parts.is_empty() {
        "done".to_string()
    } else {
        parts.join(", ")
    }
}
