//! Performance probe that times a requirement's command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::domain::models::PerformanceRequirement;
use crate::domain::ports::{CommandRunner, CommandSpec, PerformanceProbe};

/// Measures a requirement as the wall-clock milliseconds its command takes.
///
/// Requirements without a command have no measurement source and report 0.
pub struct CommandTimingProbe {
    runner: Arc<dyn CommandRunner>,
    workspace_root: PathBuf,
    timeout: Duration,
}

impl CommandTimingProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, workspace_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            workspace_root: workspace_root.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PerformanceProbe for CommandTimingProbe {
    async fn measure(&self, requirement: &PerformanceRequirement) -> Result<f64> {
        let Some(command) = &requirement.command else {
            return Ok(0.0);
        };

        let spec = CommandSpec::shell(command.clone(), self.timeout).in_dir(&self.workspace_root);
        let output = self.runner.run(&spec).await?;
        if !output.success {
            bail!(
                "measurement command for '{}' exited with {:?}",
                requirement.name,
                output.exit_code
            );
        }

        #[allow(clippy::cast_precision_loss)]
        Ok(output.duration_ms as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::TokioCommandRunner;

    fn probe() -> CommandTimingProbe {
        CommandTimingProbe::new(Arc::new(TokioCommandRunner::new()), ".", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_no_command_measures_zero() {
        let requirement = PerformanceRequirement {
            name: "latency_ms".to_string(),
            threshold: 100.0,
            command: None,
        };
        let value = probe().measure(&requirement).await.expect("measured");
        assert!(value.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_times_command() {
        let requirement = PerformanceRequirement {
            name: "sleep_ms".to_string(),
            threshold: 10_000.0,
            command: Some("sleep 0.2".to_string()),
        };
        let value = probe().measure(&requirement).await.expect("measured");
        assert!(value >= 150.0);
    }

    #[tokio::test]
    async fn test_failing_command_is_error() {
        let requirement = PerformanceRequirement {
            name: "broken".to_string(),
            threshold: 10.0,
            command: Some("exit 1".to_string()),
        };
        assert!(probe().measure(&requirement).await.is_err());
    }
}
