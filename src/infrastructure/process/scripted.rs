//! Scripted command runner for testing.
//!
//! Answers commands from a rule list instead of spawning processes. A rule
//! matches when its pattern is a substring of the command line; the first
//! matching rule wins and unmatched commands get the default response.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::CommandError;
use crate::domain::ports::{CommandOutput, CommandRunner, CommandSpec};

/// Canned result for a scripted command.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Output(CommandOutput),
    SpawnError,
    Timeout,
}

impl ScriptedResponse {
    /// Exit 0 with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::Output(CommandOutput {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            ..CommandOutput::default()
        })
    }

    /// Exit 1 with the given stderr.
    pub fn failure(stderr: impl Into<String>) -> Self {
        Self::Output(CommandOutput {
            success: false,
            exit_code: Some(1),
            stderr: stderr.into(),
            ..CommandOutput::default()
        })
    }

    /// Exit 0 after `duration_ms`, without actually waiting.
    pub fn timed(duration_ms: u64) -> Self {
        Self::Output(CommandOutput {
            success: true,
            exit_code: Some(0),
            duration_ms,
            ..CommandOutput::default()
        })
    }
}

/// [`CommandRunner`] that never spawns anything.
pub struct ScriptedCommandRunner {
    rules: RwLock<Vec<(String, ScriptedResponse)>>,
    default_response: ScriptedResponse,
    calls: RwLock<Vec<String>>,
}

impl ScriptedCommandRunner {
    /// Every command succeeds with empty output.
    pub fn new() -> Self {
        Self::with_default_response(ScriptedResponse::success(""))
    }

    pub fn with_default_response(response: ScriptedResponse) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            default_response: response,
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Answer commands containing `pattern` with `response`.
    #[must_use]
    pub fn with_rule(mut self, pattern: impl Into<String>, response: ScriptedResponse) -> Self {
        self.rules.get_mut().push((pattern.into(), response));
        self
    }

    /// Add or replace the rule for `pattern` on a shared runner.
    pub async fn set_rule(&self, pattern: impl Into<String>, response: ScriptedResponse) {
        let pattern = pattern.into();
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|(p, _)| *p == pattern) {
            Some(rule) => rule.1 = response,
            None => rules.insert(0, (pattern, response)),
        }
    }

    /// Command lines seen so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// How many command lines contained `pattern`.
    pub async fn call_count(&self, pattern: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }
}

impl Default for ScriptedCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let line = spec.display();
        self.calls.write().await.push(line.clone());

        let response = self
            .rules
            .read()
            .await
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map_or_else(|| self.default_response.clone(), |(_, r)| r.clone());

        match response {
            ScriptedResponse::Output(output) => Ok(output),
            ScriptedResponse::SpawnError => Err(CommandError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            ScriptedResponse::Timeout => Err(CommandError::Timeout {
                program: spec.program.clone(),
                timeout_ms: u64::try_from(spec.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spec(script: &str) -> CommandSpec {
        CommandSpec::shell(script, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let runner = ScriptedCommandRunner::new()
            .with_rule("npm run lint", ScriptedResponse::SpawnError)
            .with_rule("npm", ScriptedResponse::failure("error: broken"));

        assert!(runner.run(&spec("npm run lint")).await.is_err());
        let build = runner.run(&spec("npm run build")).await.expect("scripted");
        assert!(!build.success);
        let other = runner.run(&spec("ls")).await.expect("scripted");
        assert!(other.success);

        assert_eq!(runner.call_count("npm").await, 2);
    }

    #[tokio::test]
    async fn test_set_rule_replaces_response() {
        let runner = ScriptedCommandRunner::new().with_rule("build", ScriptedResponse::Timeout);
        runner.set_rule("build", ScriptedResponse::success("ok")).await;
        let output = runner.run(&spec("build")).await.expect("scripted");
        assert_eq!(output.stdout, "ok");
    }
}
