use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::CommandError;

/// A fully specified external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            current_dir: None,
            timeout,
        }
    }

    /// Run a free-form shell snippet through `sh -c`.
    pub fn shell(script: impl Into<String>, timeout: Duration) -> Self {
        Self::new("sh", vec!["-c".to_string(), script.into()], timeout)
    }

    /// Build a command from an argv list, substituting `{placeholder}` in
    /// every argument with `value`.
    pub fn from_argv(
        argv: &[String],
        substitutions: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Self, CommandError> {
        let (program, rest) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
        if program.trim().is_empty() {
            return Err(CommandError::EmptyCommand);
        }
        let args = rest
            .iter()
            .map(|arg| {
                substitutions
                    .iter()
                    .fold(arg.clone(), |acc, (key, value)| {
                        acc.replace(&format!("{{{key}}}"), value)
                    })
            })
            .collect();
        Ok(Self::new(program.clone(), args, timeout))
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// The command line as a single string, for logs and details.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero.
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Both streams, stdout first.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Port for running external commands (test, build, lint, search).
///
/// A command that ran to completion is `Ok` whatever its exit status; `Err`
/// means it could not be spawned or hit its timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv_substitutes_placeholders() {
        let argv = vec![
            "npm".to_string(),
            "test".to_string(),
            "--".to_string(),
            "{dir}".to_string(),
        ];
        let spec =
            CommandSpec::from_argv(&argv, &[("dir", "tests/unit")], Duration::from_secs(1))
                .expect("valid argv");
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["test", "--", "tests/unit"]);
        assert_eq!(spec.display(), "npm test -- tests/unit");
    }

    #[test]
    fn test_from_argv_rejects_empty() {
        let result = CommandSpec::from_argv(&[], &[], Duration::from_secs(1));
        assert!(matches!(result, Err(CommandError::EmptyCommand)));
    }

    #[test]
    fn test_shell_wraps_script() {
        let spec = CommandSpec::shell("echo hi", Duration::from_secs(1));
        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c", "echo hi"]);
    }
}
