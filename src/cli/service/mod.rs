//! Wiring of the production verification stack.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::domain::models::Config;
use crate::domain::ports::{CommandRunner, ReportStore};
use crate::infrastructure::{
    CommandTimingProbe, HttpEndpointProber, JsonFileReportStore, LocalFileSystem,
    TokioCommandRunner,
};
use crate::services::{AutoFixer, CheckEnv, EventBus, VerificationEngine, VerificationOrchestrator};

/// Engine and orchestrator backed by the local machine.
pub struct VerificationService {
    orchestrator: Arc<VerificationOrchestrator>,
    reports: Arc<JsonFileReportStore>,
}

impl VerificationService {
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine_config = &config.engine;
        let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
        let prober = HttpEndpointProber::new(Duration::from_millis(engine_config.endpoint_timeout_ms))
            .context("Failed to build endpoint prober")?;
        let timing = CommandTimingProbe::new(
            Arc::clone(&runner),
            &engine_config.workspace_root,
            Duration::from_millis(engine_config.command_timeout_ms),
        );

        let report_dir = std::path::absolute(&config.reports.directory)
            .with_context(|| format!("Invalid report directory {}", config.reports.directory))?;
        let env = Arc::new(
            CheckEnv::new(
                Arc::new(LocalFileSystem::new()),
                runner,
                Arc::new(prober),
                Arc::new(timing),
                engine_config,
                config.commands.clone(),
            )
            .with_report_dir(&report_dir),
        );

        let reports = Arc::new(JsonFileReportStore::new(report_dir));
        let store: Arc<dyn ReportStore> = reports.clone();
        let engine = Arc::new(VerificationEngine::new(Arc::clone(&env), store, engine_config));
        let orchestrator = VerificationOrchestrator::new(
            engine,
            AutoFixer::from_env(&env),
            Arc::new(EventBus::default()),
            config.orchestrator.clone(),
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            reports,
        })
    }

    pub fn orchestrator(&self) -> &Arc<VerificationOrchestrator> {
        &self.orchestrator
    }

    pub fn reports(&self) -> &JsonFileReportStore {
        &self.reports
    }
}
