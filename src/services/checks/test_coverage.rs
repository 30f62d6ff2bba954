//! Test coverage check: tests for the work exist and pass.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{extraction, Check, CheckEnv};
use crate::domain::models::{CheckDetail, CheckKind, CheckResult, Task, WeightedScore};

const DISCOVERY_WEIGHT: f64 = 5.0;
const RUNNER_WEIGHT: f64 = 10.0;

/// Markers test runners print when a run passes.
const PASS_MARKERS: &[&str] = &["passing", "PASS", "passed"];

pub struct TestCoverageCheck {
    env: Arc<CheckEnv>,
}

impl TestCoverageCheck {
    pub fn new(env: Arc<CheckEnv>) -> Self {
        Self { env }
    }

    /// Test files under the test directory, plus test files anywhere in the
    /// workspace named after a referenced source file.
    async fn discover(&self, task: &Task, stems: &[String]) -> anyhow::Result<Vec<PathBuf>> {
        let mut found = BTreeSet::new();

        if let Some(dir) = &task.test_directory {
            let dir = self.env.resolve(dir);
            if self.env.fs.is_dir(&dir).await {
                found.extend(
                    self.env
                        .fs
                        .list_files(&dir)
                        .await?
                        .into_iter()
                        .filter(|p| extraction::is_test_file(p)),
                );
            }
        }

        if !stems.is_empty() {
            let matches_stem = |path: &Path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_lowercase)
                    .is_some_and(|name| stems.iter().any(|stem| name.starts_with(stem.as_str())))
            };
            found.extend(
                self.env
                    .fs
                    .list_files(&self.env.workspace_root)
                    .await?
                    .into_iter()
                    .filter(|p| extraction::is_test_file(p) && matches_stem(p.as_path())),
            );
        }

        Ok(found.into_iter().collect())
    }

    async fn run_suite(&self, directory: &Path) -> CheckDetail {
        let dir = directory.display().to_string();
        let spec = match self.env.configured(
            &self.env.commands.test_runner,
            &[("dir", dir.as_str())],
            self.env.command_timeout,
        ) {
            Ok(spec) => spec,
            Err(e) => {
                return CheckDetail::TestRun {
                    directory: directory.to_path_buf(),
                    passed: false,
                    error: Some(e.to_string()),
                };
            }
        };

        match self.env.runner.run(&spec).await {
            Ok(output) => {
                let text = output.combined();
                let passed =
                    output.success && PASS_MARKERS.iter().any(|marker| text.contains(marker));
                CheckDetail::TestRun {
                    directory: directory.to_path_buf(),
                    passed,
                    error: (!output.success).then(|| format!("exit code {:?}", output.exit_code)),
                }
            }
            Err(e) => CheckDetail::TestRun {
                directory: directory.to_path_buf(),
                passed: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl Check for TestCoverageCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Tests
    }

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult> {
        let mut score = WeightedScore::new();
        let mut details = Vec::new();

        let stems: Vec<String> = extraction::referenced_files(task)
            .iter()
            .filter(|p| !extraction::is_test_file(p))
            .filter_map(|p| extraction::source_stem(p))
            .collect();

        if task.test_directory.is_some() || !stems.is_empty() {
            let files = self.discover(task, &stems).await?;
            score.record(DISCOVERY_WEIGHT, !files.is_empty());
            details.push(CheckDetail::TestFiles {
                count: files.len(),
                files,
            });
        }

        if let Some(directory) = &task.test_directory {
            let detail = self.run_suite(directory).await;
            score.record(RUNNER_WEIGHT, !detail.is_failure());
            details.push(detail);
        }

        if score.is_empty() {
            details.push(CheckDetail::note("No test directory or source files referenced"));
        }

        Ok(CheckResult::scored(
            self.kind(),
            score.score(self.kind().max_score()),
            details,
        ))
    }
}
