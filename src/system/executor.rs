// src/system/executor.rs

use std::ffi::OsString;
use std::process::{Command as StdCommand, Stdio};
#[cfg(unix)]
use signal_hook::consts::SIGINT;
#[cfg(unix)]
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Shell setting could not be parsed: {0}")]
    CommandParse(String),
    #[error("No shell configured to run commands with.")]
    EmptyShell,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
}

/// A fully assembled shell call: `program args... "<line>"` plus extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, OsString)>,
}

impl ShellInvocation {
    /// Splits the configured `shell` (e.g. `bash -c`, `"C:\Program Files\Git\bin\bash.exe" -c`)
    /// and appends `line` as the final argument.
    pub fn new(shell: &str, line: &str) -> Result<Self, ExecutionError> {
        let mut parts =
            shlex::split(shell).ok_or_else(|| ExecutionError::CommandParse(shell.to_string()))?;
        if parts.is_empty() {
            return Err(ExecutionError::EmptyShell);
        }
        let program = parts.remove(0);
        parts.push(line.to_string());
        Ok(Self {
            program,
            args: parts,
            env: Vec::new(),
        })
    }

    /// Adds environment variables for the child only.
    pub fn with_env(mut self, vars: Vec<(String, OsString)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Renders the call for log output.
    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    pub success: bool,
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
}

impl ChildExit {
    /// The exit code tp itself should report for this child.
    pub fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}

/// Spawns shell invocations. Swapped for a recorder in tests.
pub trait ProcessRunner {
    /// Runs the invocation to completion with the terminal's stdio attached.
    fn run(&self, invocation: &ShellInvocation) -> Result<ChildExit, ExecutionError>;
}

/// Runs invocations as real OS processes, inheriting stdin, stdout and stderr so
/// interactive prompts behave normally. Ctrl+C reaches the child through the shared
/// process group; tp simply waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &ShellInvocation) -> Result<ChildExit, ExecutionError> {
        log::debug!("Spawning: {}", invocation.display());
        let _shield = InterruptShield::raise();
        let status = StdCommand::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ExecutionError::CommandFailed(invocation.program.clone(), e))?;

        if !status.success() {
            log::debug!("Child exited with code: {:?}", status.code());
        }
        Ok(ChildExit {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// Keeps tp alive through Ctrl+C while a child runs. The terminal still delivers SIGINT
/// to the child, and tp gets to finish its own cleanup once the child is gone.
#[cfg(unix)]
struct InterruptShield {
    id: Option<signal_hook::SigId>,
    interrupted: Arc<AtomicBool>,
}

#[cfg(unix)]
impl InterruptShield {
    fn raise() -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        let id = match signal_hook::flag::register(SIGINT, Arc::clone(&interrupted)) {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Could not shield against Ctrl+C: {}", e);
                None
            }
        };
        Self { id, interrupted }
    }
}

#[cfg(unix)]
impl Drop for InterruptShield {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            signal_hook::low_level::unregister(id);
        }
        if self.interrupted.load(Ordering::SeqCst) {
            log::debug!("Child was interrupted; continuing with cleanup.");
        }
    }
}

// Console Ctrl+C reaches every attached process on Windows; nothing to shield.
#[cfg(not(unix))]
struct InterruptShield;

#[cfg(not(unix))]
impl InterruptShield {
    fn raise() -> Self {
        Self
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;

    /// Records invocations instead of spawning them. `on_run` lets a test act while
    /// the "child" is running, e.g. play the askpass helper.
    pub(crate) struct RecordingRunner {
        pub(crate) calls: RefCell<Vec<ShellInvocation>>,
        pub(crate) exit: ChildExit,
        pub(crate) on_run: Box<dyn Fn(&ShellInvocation)>,
    }

    impl RecordingRunner {
        pub(crate) fn exiting_with(success: bool, code: i32) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                exit: ChildExit { success, code: Some(code) },
                on_run: Box::new(|_: &ShellInvocation| {}),
            }
        }
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, invocation: &ShellInvocation) -> Result<ChildExit, ExecutionError> {
            (self.on_run)(invocation);
            self.calls.borrow_mut().push(invocation.clone());
            Ok(self.exit)
        }
    }

    /// A runner whose spawn always fails, as with a misspelled shell binary.
    pub(crate) struct UnspawnableRunner;

    impl ProcessRunner for UnspawnableRunner {
        fn run(&self, invocation: &ShellInvocation) -> Result<ChildExit, ExecutionError> {
            Err(ExecutionError::CommandFailed(
                invocation.program.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_split_appends_line_as_single_argument() {
        let inv = ShellInvocation::new("bash -c", "ping localhost && echo done").unwrap();
        assert_eq!(inv.program, "bash");
        assert_eq!(inv.args, vec!["-c", "ping localhost && echo done"]);
        assert!(inv.env.is_empty());
    }

    #[test]
    fn test_shell_with_quoted_program_path() {
        let inv = ShellInvocation::new(r#""/opt/my shells/zsh" -c"#, "ls").unwrap();
        assert_eq!(inv.program, "/opt/my shells/zsh");
        assert_eq!(inv.args, vec!["-c", "ls"]);
    }

    #[test]
    fn test_empty_and_unbalanced_shells_are_rejected() {
        assert!(matches!(ShellInvocation::new("   ", "ls"), Err(ExecutionError::EmptyShell)));
        assert!(matches!(
            ShellInvocation::new("bash \"-c", "ls"),
            Err(ExecutionError::CommandParse(_))
        ));
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(ChildExit { success: true, code: Some(0) }.exit_code(), 0);
        assert_eq!(ChildExit { success: false, code: Some(7) }.exit_code(), 1);
        assert_eq!(ChildExit { success: false, code: None }.exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_child_status() {
        let ok = SystemRunner.run(&ShellInvocation::new("sh -c", "exit 0").unwrap()).unwrap();
        let failed = SystemRunner.run(&ShellInvocation::new("sh -c", "exit 3").unwrap()).unwrap();
        assert!(ok.success);
        assert_eq!(failed.code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_passes_extra_env_to_child() {
        let inv = ShellInvocation::new("sh -c", "test \"$TP_TEST_MARKER\" = yes")
            .unwrap()
            .with_env(vec![("TP_TEST_MARKER".to_string(), OsString::from("yes"))]);
        assert!(SystemRunner.run(&inv).unwrap().success);
    }

    #[cfg(unix)]
    #[test]
    fn test_interrupt_shield_unregisters_on_drop() {
        let shield = InterruptShield::raise();
        assert!(shield.id.is_some());
        drop(shield);
        // A second shield can be raised once the first is gone.
        assert!(InterruptShield::raise().id.is_some());
    }

    #[test]
    fn test_missing_program_is_an_execution_error() {
        let inv = ShellInvocation::new("tp-no-such-shell-binary -c", "true").unwrap();
        assert!(matches!(SystemRunner.run(&inv), Err(ExecutionError::CommandFailed(..))));
    }
}
