//! Common test utilities for integration tests
//!
//! A verification stack rooted in a temporary workspace, with a scripted
//! command runner in place of real processes.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{broadcast, Mutex};

use taskgate::domain::models::{CommandsConfig, EngineConfig, OrchestratorConfig};
use taskgate::domain::ports::{CommandRunner, CompletionReceipt, PendingNotice, TaskLifecycle};
use taskgate::infrastructure::process::ScriptedCommandRunner;
use taskgate::infrastructure::{
    CommandTimingProbe, HttpEndpointProber, InMemoryReportStore, LocalFileSystem,
};
use taskgate::services::{
    AutoFixer, CheckEnv, EventBus, EventEnvelope, VerificationEngine, VerificationOrchestrator,
};

/// Setup test logging
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn check_env(root: &Path, runner: Arc<ScriptedCommandRunner>) -> Arc<CheckEnv> {
    let engine = EngineConfig {
        workspace_root: root.display().to_string(),
        ..EngineConfig::default()
    };
    let runner: Arc<dyn CommandRunner> = runner;
    Arc::new(CheckEnv::new(
        Arc::new(LocalFileSystem::new()),
        Arc::clone(&runner),
        Arc::new(HttpEndpointProber::new(Duration::from_secs(2)).expect("client builds")),
        Arc::new(CommandTimingProbe::new(runner, root, Duration::from_secs(5))),
        &engine,
        CommandsConfig::default(),
    ))
}

/// Orchestrator settings for tests: manual draining, no backoff.
pub fn manual_config() -> OrchestratorConfig {
    OrchestratorConfig {
        auto_verify: false,
        retry_backoff_ms: 0,
        ..OrchestratorConfig::default()
    }
}

pub struct TestStack {
    pub workspace: TempDir,
    pub runner: Arc<ScriptedCommandRunner>,
    pub reports: Arc<InMemoryReportStore>,
    pub engine: Arc<VerificationEngine>,
    pub orchestrator: Arc<VerificationOrchestrator>,
}

impl TestStack {
    pub fn new(runner: ScriptedCommandRunner, config: OrchestratorConfig) -> Self {
        Self::build(runner, config, None)
    }

    pub fn with_lifecycle(
        runner: ScriptedCommandRunner,
        config: OrchestratorConfig,
        lifecycle: Arc<dyn TaskLifecycle>,
    ) -> Self {
        Self::build(runner, config, Some(lifecycle))
    }

    fn build(
        runner: ScriptedCommandRunner,
        config: OrchestratorConfig,
        lifecycle: Option<Arc<dyn TaskLifecycle>>,
    ) -> Self {
        let workspace = tempfile::tempdir().expect("Failed to create temp dir");
        let runner = Arc::new(runner);
        let env = check_env(workspace.path(), Arc::clone(&runner));
        let reports = Arc::new(InMemoryReportStore::new());
        let engine = Arc::new(VerificationEngine::new(
            Arc::clone(&env),
            reports.clone(),
            &EngineConfig::default(),
        ));
        let mut orchestrator = VerificationOrchestrator::new(
            Arc::clone(&engine),
            AutoFixer::from_env(&env),
            Arc::new(EventBus::default()),
            config,
        );
        if let Some(lifecycle) = lifecycle {
            orchestrator = orchestrator.with_lifecycle(lifecycle);
        }

        Self {
            workspace,
            runner,
            reports,
            engine,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.workspace.path().join(relative)
    }
}

/// Names of every event already delivered to `rx`.
pub fn event_names(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        names.push(envelope.name());
    }
    names
}

/// Lifecycle fake recording every notification.
#[derive(Default)]
pub struct RecordingLifecycle {
    pub completed: Mutex<Vec<(String, CompletionReceipt)>>,
    pub pending: Mutex<Vec<(String, PendingNotice)>>,
    pub fail: bool,
}

impl RecordingLifecycle {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TaskLifecycle for RecordingLifecycle {
    async fn mark_complete(&self, task_id: &str, receipt: CompletionReceipt) -> Result<()> {
        self.completed.lock().await.push((task_id.to_string(), receipt));
        if self.fail {
            anyhow::bail!("task store unavailable");
        }
        Ok(())
    }

    async fn mark_pending(&self, task_id: &str, notice: PendingNotice) -> Result<()> {
        self.pending.lock().await.push((task_id.to_string(), notice));
        if self.fail {
            anyhow::bail!("task store unavailable");
        }
        Ok(())
    }
}
