//! The six verification checks.
//!
//! Each check gathers its own evidence through the ports in [`CheckEnv`] and
//! seals a [`CheckResult`]. Checks run in [`CheckKind::ALL`] order. An `Err`
//! from [`Check::run`] is turned into an errored result by the engine, so a
//! check only returns one when its evidence could not be gathered at all.

pub mod existence;
pub mod extraction;
pub mod functionality;
pub mod hallucination;
pub mod integration;
pub mod performance;
pub mod test_coverage;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::CommandError;
use crate::domain::models::{
    CheckKind, CheckResult, CommandsConfig, EngineConfig, ReportConfig, Task,
};
use crate::domain::ports::{
    CommandRunner, CommandSpec, EndpointProber, FileSystem, PerformanceProbe,
};

pub use existence::ExistenceCheck;
pub use functionality::FunctionalityCheck;
pub use hallucination::HallucinationCheck;
pub use integration::IntegrationCheck;
pub use performance::PerformanceCheck;
pub use test_coverage::TestCoverageCheck;

/// One evaluation dimension of a verification attempt.
#[async_trait]
pub trait Check: Send + Sync {
    fn kind(&self) -> CheckKind;

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult>;
}

/// Ports and settings shared by every check.
pub struct CheckEnv {
    pub fs: Arc<dyn FileSystem>,
    pub runner: Arc<dyn CommandRunner>,
    pub prober: Arc<dyn EndpointProber>,
    pub performance: Arc<dyn PerformanceProbe>,
    pub workspace_root: PathBuf,
    pub commands: CommandsConfig,
    /// Where verification reports are written; never counted as evidence.
    pub report_dir: PathBuf,
    pub command_timeout: Duration,
    pub lint_timeout: Duration,
    pub behavior_timeout: Duration,
}

impl CheckEnv {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        prober: Arc<dyn EndpointProber>,
        performance: Arc<dyn PerformanceProbe>,
        engine: &EngineConfig,
        commands: CommandsConfig,
    ) -> Self {
        Self {
            fs,
            runner,
            prober,
            performance,
            workspace_root: PathBuf::from(&engine.workspace_root),
            commands,
            report_dir: PathBuf::from(ReportConfig::default().directory),
            command_timeout: Duration::from_millis(engine.command_timeout_ms),
            lint_timeout: Duration::from_millis(engine.lint_timeout_ms),
            behavior_timeout: Duration::from_millis(engine.behavior_timeout_ms),
        }
    }

    /// Resolve a task-relative path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    #[must_use]
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    /// Whether `path` lies inside the report directory.
    pub fn is_report_path(&self, path: &Path) -> bool {
        self.anchored(path).starts_with(self.anchored(&self.report_dir))
    }

    fn anchored(&self, path: &Path) -> PathBuf {
        let resolved = self.resolve(path);
        normalize_path(&std::path::absolute(&resolved).unwrap_or(resolved))
    }

    /// Final component of the report directory, for `{reports}` in commands.
    pub fn report_dir_name(&self) -> String {
        normalize_path(&self.report_dir)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// A shell snippet run from the workspace root.
    pub fn shell(&self, script: &str, timeout: Duration) -> CommandSpec {
        CommandSpec::shell(script, timeout).in_dir(&self.workspace_root)
    }

    /// A configured argv command run from the workspace root.
    pub fn configured(
        &self,
        argv: &[String],
        substitutions: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<CommandSpec, CommandError> {
        Ok(CommandSpec::from_argv(argv, substitutions, timeout)?.in_dir(&self.workspace_root))
    }
}

/// The standard suite, in pipeline order.
pub fn standard_checks(env: &Arc<CheckEnv>) -> Vec<Box<dyn Check>> {
    vec![
        Box::new(ExistenceCheck::new(Arc::clone(env))),
        Box::new(FunctionalityCheck::new(Arc::clone(env))),
        Box::new(TestCoverageCheck::new(Arc::clone(env))),
        Box::new(IntegrationCheck::new(Arc::clone(env))),
        Box::new(HallucinationCheck::new(Arc::clone(env))),
        Box::new(PerformanceCheck::new(Arc::clone(env))),
    ]
}

/// Lexically resolve `.` and `..` components without touching the disk.
///
/// `..` never climbs above the root of an absolute path; on a relative path
/// a leading `..` is kept.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Lines that start with `error`, the way build and lint tools report them.
pub(crate) fn error_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.to_lowercase().starts_with("error"))
        .map(str::to_string)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_lines() {
        let output = "compiling\nerror: missing semicolon\n  Error TS2304 cannot find\nwarning: unused";
        assert_eq!(
            error_lines(output),
            vec!["error: missing semicolon", "Error TS2304 cannot find"]
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/ws/./a/../b")), PathBuf::from("/ws/b"));
        assert_eq!(normalize_path(Path::new("/ws/../../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize_path(Path::new("./a/b/..")), PathBuf::from("a"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_report_paths() {
        let dir = tempfile::tempdir().expect("temp dir");
        let runner = Arc::new(crate::infrastructure::process::ScriptedCommandRunner::new());
        let env = testing::env(dir.path(), runner);

        assert_eq!(env.report_dir_name(), "verification-reports");
        assert!(env.is_report_path(Path::new("./verification-reports/verification-1.json")));
        assert!(!env.is_report_path(Path::new("./src/widget.js")));
        assert!(!env.is_report_path(Path::new("verification-reports-old/a.json")));
    }

    #[test]
    fn test_standard_checks_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = testing::env(
            dir.path(),
            Arc::new(crate::infrastructure::process::ScriptedCommandRunner::new()),
        );
        let kinds: Vec<_> = standard_checks(&env).iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, CheckKind::ALL.to_vec());
    }
}
