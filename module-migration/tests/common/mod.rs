//! Scripted stand-in for git, go and gh.

#![allow(dead_code)]

use module_migration::{CommandOutput, CommandRunner, ExecError, MigrationConfig, Settings};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BRANCH: &str = "chore/module-migration";

pub const MAPPING: &str = "\
old;new
https://github.com/acme/svc;https://git.example.com/platform/svc
https://github.com/acme/lib;https://git.example.com/platform/lib
https://github.com/acme/tool;https://git.example.com/platform/tool
";

/// Simulated state of one working copy.
#[derive(Debug, Clone)]
pub struct FakeRepo {
    pub remote_url: String,
    pub branch: String,
    pub default_branch: String,
    pub branches: BTreeSet<String>,
    pub remote_branches: BTreeSet<String>,
    pub dirty: bool,
    pub untracked: Vec<String>,
    pub tags: Vec<String>,
}

impl FakeRepo {
    pub fn new(remote_url: &str) -> Self {
        Self {
            remote_url: remote_url.to_string(),
            branch: "main".to_string(),
            default_branch: "main".to_string(),
            branches: BTreeSet::from(["main".to_string()]),
            remote_branches: BTreeSet::new(),
            dirty: false,
            untracked: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// Adds untracked files while tracked files stay clean.
    pub fn with_untracked(mut self, files: &[&str]) -> Self {
        self.untracked = files.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Adds a local branch without checking it out.
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branches.insert(branch.to_string());
        self
    }

    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branches.insert(branch.to_string());
        self.branch = branch.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }
}

#[derive(Default)]
struct State {
    repos: Mutex<BTreeMap<PathBuf, FakeRepo>>,
    failures: Mutex<Vec<(PathBuf, String)>>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

/// A [`CommandRunner`] that simulates git per directory and records every call.
///
/// Clones share their state, so a test can keep one to inspect repositories
/// after handing another to the runner.
#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<State>,
    tools: BTreeSet<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `tool` (e.g. `gh`) appear installed.
    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tools.insert(tool.to_string());
        self
    }

    pub fn add_repo(&self, dir: &Path, repo: FakeRepo) {
        self.state.repos.lock().unwrap().insert(dir.to_path_buf(), repo);
    }

    /// Makes every command in `dir` starting with `prefix` exit with code 1.
    pub fn fail(&self, dir: &Path, prefix: &str) {
        self.state
            .failures
            .lock()
            .unwrap()
            .push((dir.to_path_buf(), prefix.to_string()));
    }

    pub fn repo(&self, dir: &Path) -> FakeRepo {
        self.state.repos.lock().unwrap()[dir].clone()
    }

    /// Returns the commands run in `dir`, in order.
    pub fn calls(&self, dir: &Path) -> Vec<String> {
        self.state
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| d == dir)
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn execute(&self, dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        let command = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.state
            .calls
            .lock()
            .unwrap()
            .push((dir.to_path_buf(), command.clone()));

        let scripted = self
            .state
            .failures
            .lock()
            .unwrap()
            .iter()
            .any(|(d, prefix)| d == dir && command.starts_with(prefix.as_str()));
        if scripted {
            return Err(failed(&command, 1, "fatal: scripted failure"));
        }

        match program {
            "git" => self.git(dir, &command, args),
            "go" => Ok(CommandOutput::default()),
            "gh" => Ok(CommandOutput::from_stdout(
                "https://git.example.com/platform/svc/pull/7\n",
            )),
            _ => Err(ExecError::NotFound {
                program: program.to_string(),
            }),
        }
    }

    fn git(&self, dir: &Path, command: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        let mut repos = self.state.repos.lock().unwrap();
        let Some(repo) = repos.get_mut(dir) else {
            return Err(failed(command, 128, "fatal: not a git repository"));
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let stdout = match args.as_slice() {
            ["remote", "get-url", "--all", _] => repo.remote_url.clone(),
            ["remote", "remove", _] => String::new(),
            ["remote", "add", _, url] => {
                repo.remote_url = (*url).to_string();
                String::new()
            }
            ["ls-remote", _] => "0000000000000000000000000000000000000000\tHEAD".to_string(),
            ["update-index", "--refresh"] | ["add", "--all"] => String::new(),
            ["diff-index", "--quiet", "HEAD", "--"] => {
                if repo.dirty {
                    return Err(failed(command, 1, ""));
                }
                String::new()
            }
            ["ls-files", "--others", "--exclude-standard"] => repo.untracked.join("\n"),
            ["rev-parse", "--abbrev-ref", "HEAD"] => repo.branch.clone(),
            ["rev-parse", "--abbrev-ref", head] => {
                let remote = head.trim_end_matches("/HEAD");
                format!("{remote}/{}", repo.default_branch)
            }
            ["rev-parse", "--verify", revision] => {
                let found = match revision.strip_prefix("refs/heads/") {
                    Some(branch) => repo.branches.contains(branch),
                    None => {
                        repo.branches.contains(*revision)
                            || repo.tags.iter().any(|tag| tag == revision)
                    }
                };
                if !found {
                    return Err(failed(command, 128, "fatal: Needed a single revision"));
                }
                "0000000000000000000000000000000000000000".to_string()
            }
            ["checkout", "-b", branch] => {
                repo.branches.insert((*branch).to_string());
                repo.branch = (*branch).to_string();
                format!("Switched to a new branch '{branch}'")
            }
            ["checkout", branch] => {
                if !repo.branches.contains(*branch) {
                    return Err(failed(command, 1, "error: pathspec did not match"));
                }
                repo.branch = (*branch).to_string();
                format!("Switched to branch '{branch}'")
            }
            ["branch", "-D", branch] => {
                if repo.branch == *branch || !repo.branches.remove(*branch) {
                    return Err(failed(command, 1, "error: cannot delete branch"));
                }
                String::new()
            }
            ["commit", "-m", _] => {
                repo.dirty = false;
                repo.untracked.clear();
                String::new()
            }
            ["push", "--set-upstream", _, branch] => {
                repo.remote_branches.insert((*branch).to_string());
                format!(
                    "remote: To create a merge request for {branch}, visit:\n\
                     remote:   https://git.example.com/platform/svc/-/merge_requests/new?merge_request%5Bsource_branch%5D={branch}\n"
                )
            }
            ["push", _, "--delete", branch] => {
                if !repo.remote_branches.remove(*branch) {
                    return Err(failed(command, 1, "error: unable to delete: remote ref does not exist"));
                }
                String::new()
            }
            ["push", _, "--tags"] | ["pull", ..] | ["fetch", ..] => String::new(),
            ["tag"] => repo.tags.join("\n"),
            ["tag", tag] => {
                repo.tags.push((*tag).to_string());
                String::new()
            }
            _ => return Err(failed(command, 129, "usage: unscripted git command")),
        };
        Ok(CommandOutput::from_stdout(stdout))
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput, ExecError>> + Send {
        let result = self.execute(dir, program, args);
        async move { result }
    }

    fn is_available(&self, program: &str) -> bool {
        self.tools.contains(program)
    }
}

fn failed(command: &str, exit_code: i32, output: &str) -> ExecError {
    ExecError::Failed {
        command: command.to_string(),
        exit_code,
        output: output.to_string(),
        stderr: output.to_string(),
    }
}

/// Creates `root/name` with an empty `.git` directory.
pub fn init_repo(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(dir.join(".git")).unwrap();
    dir
}

/// Creates a module repository with a `go.mod` declaring `module`.
pub fn init_module(root: &Path, name: &str, manifest: &str) -> PathBuf {
    let dir = init_repo(root, name);
    fs::write(dir.join("go.mod"), manifest).unwrap();
    dir
}

/// Writes the mapping file next to the repositories and returns settings for it.
pub fn settings(temp: &TempDir, branch: Option<&str>) -> Settings {
    let csv = temp.path().join("mapping.csv");
    fs::write(&csv, MAPPING).unwrap();
    MigrationConfig {
        csv,
        branch: branch.map(str::to_string),
        ..MigrationConfig::default()
    }
    .validate()
    .unwrap()
}
