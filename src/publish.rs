// Publish helpers: commit-and-push of the working tree and the deployment
// trigger. Both are thin sequences of external programs; the programs are
// launched through `CommandRunner` so the sequences can be checked without
// touching a real repository.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

/// A program invocation: the program, its arguments and where to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str], dir: &Path) -> Self {
        Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            dir: dir.to_path_buf(),
        }
    }

    /// Command line as a single string, used in logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit code plus whatever was captured from stdout.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait CommandRunner {
    /// Run with the terminal attached; nothing is captured.
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput>;
    /// Run and capture stdout.
    fn capture(&mut self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs real processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.dir);
        cmd
    }

    fn spawn_err(invocation: &Invocation) -> impl FnOnce(std::io::Error) -> Error + '_ {
        move |source| Error::Spawn {
            command: invocation.display(),
            source,
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<CommandOutput> {
        let status = Self::command(invocation)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(Self::spawn_err(invocation))?;
        Ok(CommandOutput {
            code: status.code(),
            stdout: String::new(),
        })
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<CommandOutput> {
        let output = Self::command(invocation)
            .stderr(Stdio::inherit())
            .output()
            .map_err(Self::spawn_err(invocation))?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

fn run_checked(runner: &mut dyn CommandRunner, invocation: &Invocation) -> Result<CommandOutput> {
    let output = runner.run(invocation)?;
    if !output.success() {
        return Err(Error::CommandFailed {
            command: invocation.display(),
            code: output.code,
        });
    }
    Ok(output)
}

/// Stage everything, show the short status, commit with `message` and push.
/// Stops at the first git command that fails. Returns the short status.
pub fn commit_and_push(
    runner: &mut dyn CommandRunner,
    repo_dir: &Path,
    message: &str,
) -> Result<String> {
    info!(dir = %repo_dir.display(), "git: adding all changes");
    run_checked(runner, &Invocation::new("git", &["add", "-A"], repo_dir))?;

    let status = runner.capture(&Invocation::new("git", &["status", "--short"], repo_dir))?;
    // The caller prints the status itself; only note its size here.
    debug!(changed = status.stdout.lines().count(), "git: status captured");

    info!("git: committing changes");
    run_checked(runner, &Invocation::new("git", &["commit", "-m", message], repo_dir))?;

    info!("git: pushing to remote");
    run_checked(runner, &Invocation::new("git", &["push"], repo_dir))?;

    info!("all changes committed and pushed");
    Ok(status.stdout)
}

/// Arguments for the deployment CLI.
pub fn deploy_invocation(project_dir: &Path, production: bool) -> Invocation {
    let mut args = vec!["vercel"];
    if production {
        args.push("--prod");
    }
    Invocation::new("npx", &args, project_dir)
}

/// Run the deployment CLI with the terminal attached and hand back its
/// exit code. A process killed by a signal reports 1.
pub fn deploy(runner: &mut dyn CommandRunner, project_dir: &Path, production: bool) -> Result<i32> {
    let invocation = deploy_invocation(project_dir, production);
    info!(command = %invocation.display(), "starting deployment");
    let output = runner.run(&invocation)?;
    let code = output.code.unwrap_or(1);
    if code == 0 {
        info!("deployment completed successfully");
    } else {
        error!(code, "deployment failed");
    }
    Ok(code)
}
