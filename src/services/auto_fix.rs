//! Automatic remediation between verification attempts.
//!
//! A [`Recommendation`] maps to exactly one [`Remediation`]. Only missing
//! files and lint failures can be fixed automatically; everything else is
//! [`Remediation::Unsupported`] and reported as such.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::domain::models::{CheckDetail, LintOutcome, Recommendation, RecommendedAction};
use crate::domain::ports::{CommandRunner, CommandSpec, FileSystem};
use crate::services::checks::{normalize_path, CheckEnv};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remediation {
    /// Create placeholder files and the directories the task expects.
    CreateMissingFiles {
        files: Vec<PathBuf>,
        directories: Vec<PathBuf>,
    },
    /// Run the lint command in fix mode.
    LintAutoFix,
    Unsupported { action: RecommendedAction },
}

impl Remediation {
    pub fn for_recommendation(recommendation: &Recommendation) -> Self {
        match recommendation.action {
            RecommendedAction::CreateMissingResources => {
                let mut files = Vec::new();
                let mut directories = Vec::new();
                for detail in &recommendation.details {
                    match detail {
                        CheckDetail::File { path, exists: false } => files.push(path.clone()),
                        CheckDetail::Directory { path, exists: false } => {
                            directories.push(path.clone());
                        }
                        _ => {}
                    }
                }
                if files.is_empty() && directories.is_empty() {
                    Self::Unsupported {
                        action: recommendation.action,
                    }
                } else {
                    Self::CreateMissingFiles { files, directories }
                }
            }
            RecommendedAction::FixBuildAndLint
                if recommendation
                    .details
                    .iter()
                    .any(|d| matches!(d, CheckDetail::Lint(LintOutcome::Failed { .. }))) =>
            {
                Self::LintAutoFix
            }
            action => Self::Unsupported { action },
        }
    }
}

/// Starting content for a created file, by extension.
fn placeholder_body(path: &Path, description: &str) -> String {
    let summary = description.lines().next().unwrap_or_default().trim();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "js" | "cjs" => format!("// Auto-generated file for: {summary}\n\nmodule.exports = {{}};\n"),
        "ts" | "mjs" | "tsx" | "jsx" => {
            format!("// Auto-generated file for: {summary}\n\nexport {{}};\n")
        }
        "rs" | "go" | "java" | "c" | "cpp" | "h" => format!("// Auto-generated file for: {summary}\n"),
        "py" | "sh" | "rb" | "yaml" | "yml" | "toml" => format!("# Auto-generated file for: {summary}\n"),
        "json" => "{}".to_string(),
        "md" => {
            let title = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            format!("# {title}\n\nAuto-generated for: {summary}\n")
        }
        _ => String::new(),
    }
}

pub struct AutoFixer {
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    workspace_root: PathBuf,
    lint_fix: Vec<String>,
    lint_timeout: Duration,
}

impl AutoFixer {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        workspace_root: impl Into<PathBuf>,
        lint_fix: Vec<String>,
        lint_timeout: Duration,
    ) -> Self {
        Self {
            fs,
            runner,
            workspace_root: workspace_root.into(),
            lint_fix,
            lint_timeout,
        }
    }

    /// Fixer sharing the filesystem, runner and workspace of the checks.
    pub fn from_env(env: &CheckEnv) -> Self {
        Self::new(
            Arc::clone(&env.fs),
            Arc::clone(&env.runner),
            env.workspace_root.clone(),
            env.commands.lint_fix.clone(),
            env.lint_timeout,
        )
    }

    /// Resolve `path` against the workspace, refusing anything that lands
    /// outside it.
    fn confine(&self, path: &Path) -> Result<PathBuf> {
        let root = std::path::absolute(&self.workspace_root)
            .map(|root| normalize_path(&root))
            .with_context(|| format!("Invalid workspace root {}", self.workspace_root.display()))?;
        let target = normalize_path(&root.join(path));
        if target == root || !target.starts_with(&root) {
            bail!(
                "refusing to create {}: outside workspace {}",
                path.display(),
                root.display()
            );
        }
        Ok(target)
    }

    /// Apply a remediation, returning a summary of what changed.
    pub async fn apply(&self, remediation: &Remediation, task_description: &str) -> Result<String> {
        match remediation {
            Remediation::CreateMissingFiles { files, directories } => {
                self.create_missing(files, directories, task_description).await
            }
            Remediation::LintAutoFix => self.lint_fix().await,
            Remediation::Unsupported { action } => {
                bail!("no auto-fix available for {}", action.describe())
            }
        }
    }

    async fn create_missing(
        &self,
        files: &[PathBuf],
        directories: &[PathBuf],
        task_description: &str,
    ) -> Result<String> {
        let directories = directories
            .iter()
            .map(|dir| self.confine(dir).map(|target| (dir, target)))
            .collect::<Result<Vec<_>>>()?;
        let files = files
            .iter()
            .map(|file| self.confine(file).map(|target| (file, target)))
            .collect::<Result<Vec<_>>>()?;
        let mut created = Vec::new();

        for (dir, target) in directories {
            self.fs.create_dir_all(&target).await?;
            created.push(dir.display().to_string());
        }

        for (file, target) in files {
            if self.fs.exists(&target).await {
                continue;
            }
            if let Some(parent) = target.parent() {
                self.fs.create_dir_all(parent).await?;
            }
            self.fs
                .write_file(&target, &placeholder_body(file, task_description))
                .await?;
            created.push(file.display().to_string());
        }

        tracing::info!(created = created.len(), "Created missing resources");
        Ok(format!("created {}", created.join(", ")))
    }

    async fn lint_fix(&self) -> Result<String> {
        let spec = CommandSpec::from_argv(&self.lint_fix, &[], self.lint_timeout)?
            .in_dir(&self.workspace_root);
        let output = self
            .runner
            .run(&spec)
            .await
            .with_context(|| format!("`{}` did not complete", spec.display()))?;
        if !output.success {
            bail!(
                "`{}` exited with {:?}: {}",
                spec.display(),
                output.exit_code,
                output.stderr.trim()
            );
        }
        Ok(format!("ran {}", spec.display()))
    }
}
