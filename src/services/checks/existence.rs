//! Existence check: the files and directories a task refers to are on disk.

use std::sync::Arc;

use async_trait::async_trait;

use super::{extraction, Check, CheckEnv};
use crate::domain::models::{CheckDetail, CheckKind, CheckResult, Task, WeightedScore};

const FILE_WEIGHT: f64 = 2.0;
const DIRECTORY_WEIGHT: f64 = 1.0;

pub struct ExistenceCheck {
    env: Arc<CheckEnv>,
}

impl ExistenceCheck {
    pub fn new(env: Arc<CheckEnv>) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Check for ExistenceCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Existence
    }

    async fn run(&self, task: &Task) -> anyhow::Result<CheckResult> {
        let mut score = WeightedScore::new();
        let mut details = Vec::new();

        for path in extraction::referenced_files(task) {
            let exists = self.env.fs.exists(&self.env.resolve(&path)).await;
            score.record(FILE_WEIGHT, exists);
            details.push(CheckDetail::File { path, exists });
        }

        for path in &task.expected_directories {
            let exists = self.env.fs.is_dir(&self.env.resolve(path)).await;
            score.record(DIRECTORY_WEIGHT, exists);
            details.push(CheckDetail::Directory {
                path: path.clone(),
                exists,
            });
        }

        if score.is_empty() {
            details.push(CheckDetail::note("No files or directories referenced"));
        }

        tracing::debug!(
            task_id = %task.id,
            check = %self.kind(),
            missing = details.iter().filter(|d| d.is_failure()).count(),
            "Existence evidence gathered"
        );

        Ok(CheckResult::scored(
            self.kind(),
            score.score(self.kind().max_score()),
            details,
        ))
    }
}
