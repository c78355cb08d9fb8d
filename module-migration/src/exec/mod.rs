//! Subprocess execution for git, the Go toolchain and the `gh` CLI.
//!
//! Every external tool is invoked through a [`CommandRunner`], which makes the
//! per-repository workflow testable without real binaries. A [`Session`] binds
//! a runner to one working directory and observes the run's cancellation token
//! before starting each new process.

mod error;
mod runner;
mod session;

pub use error::ExecError;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use session::Session;

/// Renders a program and its arguments the way they would be typed in a shell.
pub(crate) fn render_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{program} {}", args.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_command_with_args() {
        let args = vec!["remote".to_string(), "get-url".to_string()];
        assert_eq!(render_command("git", &args), "git remote get-url");
    }

    #[test]
    fn renders_bare_command() {
        assert_eq!(render_command("go", &[]), "go");
    }
}
