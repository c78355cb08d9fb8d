//! Orchestrates runs over every repository below a root directory.
//!
//! Each repository is processed by its own tokio task. Tasks share only
//! read-only data behind an [`Arc`]; a failing repository is recorded in the
//! [`RunSummary`] and never affects its siblings.

mod config;
mod error;

pub use config::RunnerConfig;
pub use error::{MigrationError, RunnerError};

use crate::config::Settings;
use crate::discovery::{self, Repository};
use crate::exec::{CommandRunner, Session, SystemRunner};
use crate::git::Git;
use crate::manifest;
use crate::mapping::{MappingTables, Replacer};
use crate::reconcile::{self, ReconcileSettings, RemoteDisposition, CHANGE_REQUEST_TOOL};
use crate::release::{self, ReleaseError, ReleaseSettings, TagVersion};
use crate::rewrite::{copy_into, ContentRewriter, InclusionPolicy, TouchedFiles, MANIFEST_EXCLUDE};
use crate::summary::{ProcessingResult, RepositoryReport, RunSummary};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Read-only data shared by the repository tasks of a run.
struct MigrationContext {
    tables: MappingTables,
    replacer: Replacer,
    rewriter: ContentRewriter,
    copy: Vec<PathBuf>,
    reconcile: ReconcileSettings,
}

/// What a repository task produced.
enum Processed {
    /// The repository was changed as reported.
    Done(RepositoryReport),
    /// Dry run: nothing was changed, the string says what would happen.
    Previewed(String),
}

/// Orchestrates migrate, commit, rewrite and release runs.
pub struct Runner<R = SystemRunner> {
    config: RunnerConfig,
    commands: Arc<R>,
    cancel: CancellationToken,
}

impl Runner<SystemRunner> {
    /// Builds a runner that executes real processes.
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_command_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> Runner<R> {
    /// Builds a runner on top of a custom [`CommandRunner`].
    pub fn with_command_runner(config: RunnerConfig, commands: R) -> Self {
        Self {
            config,
            commands: Arc::new(commands),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns the token that interrupts this runner when cancelled.
    ///
    /// After cancellation no new subprocess is started and repositories that
    /// have not started yet are skipped. Running subprocesses finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Migrates every Go module repository: manifest, content, additional
    /// files, build check, remote and branch reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the run cannot start. Per-repository
    /// failures are recorded in the summary.
    pub async fn migrate(&self, settings: &Settings) -> Result<RunSummary, RunnerError> {
        let root = self.root()?;
        let tables = settings.load_mapping()?;
        let policy = settings.policy.with_excludes(MANIFEST_EXCLUDE)?;
        let context = Arc::new(self.context(settings, tables, policy)?);

        let repositories = discovery::find_module_repositories(&root)?;
        let mut summary = RunSummary::new(self.config.dry_run());
        summary.repositories_discovered = repositories.len();
        if repositories.is_empty() {
            warn!(root = %root.display(), "No module repositories found");
            return Ok(summary);
        }

        let dry_run = self.config.dry_run();
        let results = self
            .fan_out(repositories, |repository, commands, cancel| {
                let context = Arc::clone(&context);
                async move {
                    if dry_run {
                        preview_remote(commands, cancel, context, repository).await
                    } else {
                        migrate_repository(commands, cancel, context, repository).await
                    }
                }
            })
            .await;

        Ok(finish(summary, results))
    }

    /// Reconciles the remote of every git repository and commits pending
    /// changes on the configured branch.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the run cannot start.
    pub async fn commit(&self, settings: &Settings) -> Result<RunSummary, RunnerError> {
        let root = self.root()?;
        let tables = settings.load_mapping()?;
        let context = Arc::new(self.context(settings, tables, settings.policy.clone())?);

        let repositories = discovery::find_repositories(&root)?;
        let mut summary = RunSummary::new(self.config.dry_run());
        summary.repositories_discovered = repositories.len();
        if repositories.is_empty() {
            warn!(root = %root.display(), "No repositories found");
            return Ok(summary);
        }

        let dry_run = self.config.dry_run();
        let results = self
            .fan_out(repositories, |repository, commands, cancel| {
                let context = Arc::clone(&context);
                async move {
                    if dry_run {
                        preview_remote(commands, cancel, context, repository).await
                    } else {
                        commit_repository(commands, cancel, context, repository).await
                    }
                }
            })
            .await;

        Ok(finish(summary, results))
    }

    /// Rewrites the whole tree below the root in one pass and returns the
    /// touched files. In dry-run mode nothing is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the mapping cannot be loaded or the rewrite
    /// fails.
    pub async fn rewrite(&self, settings: &Settings) -> Result<TouchedFiles, RunnerError> {
        let root = self.root()?;
        let tables = settings.load_mapping()?;
        let replacer = tables.replacer()?;

        if self.config.dry_run() {
            info!(
                root = %root.display(),
                patterns = replacer.len(),
                "Dry run, nothing rewritten"
            );
            return Ok(TouchedFiles::default());
        }

        let rewriter = ContentRewriter::new(settings.policy.clone());
        let touched =
            tokio::task::spawn_blocking(move || rewriter.rewrite_dir(&root, &replacer)).await??;
        info!(files = touched.len(), "Rewrite complete");
        Ok(touched)
    }

    /// Tags the next release on the default branch of every git repository.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the run cannot start.
    pub async fn release(&self, settings: &ReleaseSettings) -> Result<RunSummary, RunnerError> {
        let root = self.root()?;
        let repositories = discovery::find_repositories(&root)?;
        let mut summary = RunSummary::new(self.config.dry_run());
        summary.repositories_discovered = repositories.len();
        if repositories.is_empty() {
            warn!(root = %root.display(), "No repositories found");
            return Ok(summary);
        }

        let settings = Arc::new(settings.clone());
        let dry_run = self.config.dry_run();
        let results = self
            .fan_out(repositories, |repository, commands, cancel| {
                let settings = Arc::clone(&settings);
                async move {
                    if dry_run {
                        preview_release(commands, cancel, settings, repository).await
                    } else {
                        release_repository(commands, cancel, settings, repository).await
                    }
                }
            })
            .await;

        Ok(finish(summary, results))
    }

    fn root(&self) -> Result<PathBuf, RunnerError> {
        let root_error = |source| RunnerError::Root {
            path: self.config.root().display().to_string(),
            source,
        };
        let root = std::path::absolute(self.config.root()).map_err(root_error)?;
        let metadata = std::fs::metadata(&root).map_err(root_error)?;
        if !metadata.is_dir() {
            return Err(root_error(std::io::Error::other("not a directory")));
        }
        Ok(root)
    }

    fn context(
        &self,
        settings: &Settings,
        tables: MappingTables,
        policy: InclusionPolicy,
    ) -> Result<MigrationContext, RunnerError> {
        let change_requests = self.commands.is_available(CHANGE_REQUEST_TOOL);
        if !change_requests {
            info!(
                tool = CHANGE_REQUEST_TOOL,
                "Change request tool not found, change requests will be skipped"
            );
        }
        info!(
            remotes = tables.remote_urls.len(),
            modules = tables.module_paths.len(),
            "Loaded mapping"
        );

        Ok(MigrationContext {
            replacer: tables.replacer()?,
            tables,
            rewriter: ContentRewriter::new(policy),
            copy: settings.copy.clone(),
            reconcile: settings.reconcile_settings(change_requests),
        })
    }

    async fn fan_out<F, Fut>(&self, repositories: Vec<Repository>, mut task: F) -> Vec<ProcessingResult>
    where
        F: FnMut(Repository, Arc<R>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<Processed, MigrationError>> + Send + 'static,
    {
        let limit = self.config.limit(repositories.len());
        info!(count = repositories.len(), limit, "Processing repositories");

        stream::iter(repositories)
            .map(|repository| {
                let name = repository.to_string();
                let handle = (!self.cancel.is_cancelled()).then(|| {
                    let span = info_span!("repository", repo = %name);
                    tokio::spawn(
                        task(repository, Arc::clone(&self.commands), self.cancel.clone())
                            .instrument(span),
                    )
                });

                async move {
                    let Some(handle) = handle else {
                        debug!(repo = %name, "Interrupted before start");
                        return ProcessingResult::Skipped {
                            repository: name,
                            reason: "interrupted".to_string(),
                        };
                    };

                    match handle.await.map_err(MigrationError::from).and_then(|r| r) {
                        Ok(Processed::Done(report)) => {
                            info!(repo = %name, "Successfully processed");
                            ProcessingResult::Success {
                                repository: name,
                                report,
                            }
                        }
                        Ok(Processed::Previewed(reason)) => {
                            info!(repo = %name, "{reason}");
                            ProcessingResult::Skipped {
                                repository: name,
                                reason,
                            }
                        }
                        Err(e) => {
                            error!(repo = %name, error = %e, "Failed to process repository");
                            ProcessingResult::Failed {
                                repository: name,
                                error: e.to_string(),
                            }
                        }
                    }
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }
}

fn finish(mut summary: RunSummary, results: Vec<ProcessingResult>) -> RunSummary {
    for result in results {
        summary.record_result(result);
    }
    info!(
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "Run complete"
    );
    summary
}

async fn migrate_repository<R: CommandRunner>(
    commands: Arc<R>,
    cancel: CancellationToken,
    context: Arc<MigrationContext>,
    repository: Repository,
) -> Result<Processed, MigrationError> {
    let dir = repository.path().to_path_buf();
    let session = Session::new(commands.as_ref(), &dir, &cancel);

    if let Err(e) = Git::new(&session).pull().await {
        if e.is_cancelled() {
            return Err(e.into());
        }
        debug!(error = %e, "Pull failed, continuing");
    }

    let remote =
        reconcile::resolve_remote(&session, &context.tables, &context.reconcile.remote).await?;

    let change = {
        let context = Arc::clone(&context);
        let dir = dir.clone();
        let target = remote.target_url.clone();
        tokio::task::spawn_blocking(move || {
            manifest::migrate_manifest(&dir, &context.tables.module_paths, Some(target.as_str()))
        })
        .await??
    };
    manifest::update_dependencies(&session, &change.updated_dependencies).await?;

    let replacer = match &change.module_rename {
        Some((old, new)) if !context.tables.module_paths.contains_key(old) => {
            context.replacer.with_entry(old, new)?
        }
        _ => context.replacer.clone(),
    };

    let (touched_files, copied_files) = {
        let context = Arc::clone(&context);
        let dir = dir.clone();
        tokio::task::spawn_blocking(move || {
            let touched = context.rewriter.rewrite_repository(&dir, &replacer)?;
            let mut copied = Vec::new();
            for source in &context.copy {
                copied.extend(copy_into(source, &dir)?);
            }
            Ok::<_, MigrationError>((touched, copied))
        })
        .await??
    };
    info!(
        touched = touched_files.len(),
        copied = copied_files.len(),
        "Rewrote repository content"
    );

    manifest::verify_build(&session).await?;

    let outcome = reconcile::reconcile(&session, &context.tables, &context.reconcile).await?;
    info!(outcome = %outcome.describe(), "Reconciled");

    Ok(Processed::Done(RepositoryReport {
        module_rename: change.module_rename,
        updated_dependencies: change.updated_dependencies,
        touched_files,
        copied_files,
        outcome: Some(outcome),
        release: None,
    }))
}

async fn commit_repository<R: CommandRunner>(
    commands: Arc<R>,
    cancel: CancellationToken,
    context: Arc<MigrationContext>,
    repository: Repository,
) -> Result<Processed, MigrationError> {
    let session = Session::new(commands.as_ref(), repository.path(), &cancel);
    let outcome = reconcile::reconcile(&session, &context.tables, &context.reconcile).await?;
    info!(outcome = %outcome.describe(), "Reconciled");

    Ok(Processed::Done(RepositoryReport {
        outcome: Some(outcome),
        ..RepositoryReport::default()
    }))
}

async fn preview_remote<R: CommandRunner>(
    commands: Arc<R>,
    cancel: CancellationToken,
    context: Arc<MigrationContext>,
    repository: Repository,
) -> Result<Processed, MigrationError> {
    let session = Session::new(commands.as_ref(), repository.path(), &cancel);
    let state =
        reconcile::resolve_remote(&session, &context.tables, &context.reconcile.remote).await?;

    let action = match state.disposition {
        RemoteDisposition::Mapped { from, to } => {
            format!("dry run: would change remote url from {from} to {to}")
        }
        RemoteDisposition::AlreadyTarget => {
            format!("dry run: remote already at {}", state.target_url)
        }
    };
    Ok(Processed::Previewed(action))
}

async fn release_repository<R: CommandRunner>(
    commands: Arc<R>,
    cancel: CancellationToken,
    settings: Arc<ReleaseSettings>,
    repository: Repository,
) -> Result<Processed, MigrationError> {
    let session = Session::new(commands.as_ref(), repository.path(), &cancel);
    let release = release::release(&session, &settings).await?;

    Ok(Processed::Done(RepositoryReport {
        release: Some(release),
        ..RepositoryReport::default()
    }))
}

async fn preview_release<R: CommandRunner>(
    commands: Arc<R>,
    cancel: CancellationToken,
    settings: Arc<ReleaseSettings>,
    repository: Repository,
) -> Result<Processed, MigrationError> {
    let session = Session::new(commands.as_ref(), repository.path(), &cancel);
    let git = Git::new(&session);
    let tags = git.tags().await.map_err(ReleaseError::from)?;
    let repo = repository.to_string();
    if tags.is_empty() {
        return Err(ReleaseError::NoTags { repo }.into());
    }
    let Some(latest) = TagVersion::latest(&tags) else {
        return Err(ReleaseError::NoVersionTags { repo, tags }.into());
    };

    Ok(Processed::Previewed(format!(
        "dry run: would tag {} after {latest}",
        latest.bump(settings.bump)
    )))
}
