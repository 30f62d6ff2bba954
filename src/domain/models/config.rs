use serde::{Deserialize, Serialize};

use super::record::Severity;

/// Main configuration structure for Taskgate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Verification engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Queue, retry and blocking configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// External tool invocations
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Report storage configuration
    #[serde(default)]
    pub reports: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Verification engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Use `strict_threshold` instead of `lenient_threshold`
    #[serde(default = "default_true")]
    pub strict_mode: bool,

    /// Confidence needed to pass in strict mode (0-100)
    #[serde(default = "default_strict_threshold")]
    pub strict_threshold: f64,

    /// Confidence needed to pass otherwise (0-100)
    #[serde(default = "default_lenient_threshold")]
    pub lenient_threshold: f64,

    /// Directory that relative task paths resolve against
    #[serde(default = "default_workspace_root")]
    pub workspace_root: String,

    /// Timeout for test, build and search commands
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Timeout for the lint command
    #[serde(default = "default_lint_timeout_ms")]
    pub lint_timeout_ms: u64,

    /// Timeout for behavior scripts
    #[serde(default = "default_behavior_timeout_ms")]
    pub behavior_timeout_ms: u64,

    /// Timeout for a single endpoint probe
    #[serde(default = "default_endpoint_timeout_ms")]
    pub endpoint_timeout_ms: u64,

    /// Upper bound for a whole check
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_strict_threshold() -> f64 {
    80.0
}

const fn default_lenient_threshold() -> f64 {
    60.0
}

fn default_workspace_root() -> String {
    ".".to_string()
}

const fn default_command_timeout_ms() -> u64 {
    30_000
}

const fn default_lint_timeout_ms() -> u64 {
    10_000
}

const fn default_behavior_timeout_ms() -> u64 {
    10_000
}

const fn default_endpoint_timeout_ms() -> u64 {
    5_000
}

const fn default_check_timeout_ms() -> u64 {
    120_000
}

impl EngineConfig {
    /// Confidence a verification needs to pass under the current mode.
    pub fn pass_threshold(&self) -> f64 {
        if self.strict_mode {
            self.strict_threshold
        } else {
            self.lenient_threshold
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_mode: true,
            strict_threshold: default_strict_threshold(),
            lenient_threshold: default_lenient_threshold(),
            workspace_root: default_workspace_root(),
            command_timeout_ms: default_command_timeout_ms(),
            lint_timeout_ms: default_lint_timeout_ms(),
            behavior_timeout_ms: default_behavior_timeout_ms(),
            endpoint_timeout_ms: default_endpoint_timeout_ms(),
            check_timeout_ms: default_check_timeout_ms(),
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Start draining as soon as a task is queued
    #[serde(default = "default_true")]
    pub auto_verify: bool,

    /// Add tasks that exhaust their retries to the blocked set
    #[serde(default = "default_true")]
    pub block_on_failure: bool,

    /// Retry failed verifications (with auto-fix) until `max_retries`
    #[serde(default = "default_true")]
    pub retry_on_failure: bool,

    /// Attempts per task, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Confidence the orchestrator requires on top of the engine verdict
    #[serde(default = "default_verification_threshold")]
    pub verification_threshold: f64,

    /// Base delay between attempts; attempt `n` waits `n * retry_backoff_ms`
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Least severe recommendation that triggers an auto-fix
    #[serde(default = "default_auto_fix_min_severity")]
    pub auto_fix_min_severity: Severity,

    /// Reject completion of tasks that fail verification
    #[serde(default = "default_true")]
    pub strict_completion: bool,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_verification_threshold() -> f64 {
    80.0
}

const fn default_retry_backoff_ms() -> u64 {
    1_000
}

const fn default_auto_fix_min_severity() -> Severity {
    Severity::Critical
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_verify: true,
            block_on_failure: true,
            retry_on_failure: true,
            max_retries: default_max_retries(),
            verification_threshold: default_verification_threshold(),
            retry_backoff_ms: default_retry_backoff_ms(),
            auto_fix_min_severity: default_auto_fix_min_severity(),
            strict_completion: true,
        }
    }
}

/// External tool invocations, as argv lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandsConfig {
    /// Project build command
    #[serde(default = "default_build")]
    pub build: Vec<String>,

    /// Project lint command
    #[serde(default = "default_lint")]
    pub lint: Vec<String>,

    /// Lint command in auto-fix mode
    #[serde(default = "default_lint_fix")]
    pub lint_fix: Vec<String>,

    /// Test runner; `{dir}` is replaced by the task's test directory
    #[serde(default = "default_test_runner")]
    pub test_runner: Vec<String>,

    /// Codebase text search; `{query}` is replaced by the searched name and
    /// `{reports}` by the name of the report directory
    #[serde(default = "default_search")]
    pub search: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_string()).collect()
}

fn default_build() -> Vec<String> {
    argv(&["npm", "run", "build"])
}

fn default_lint() -> Vec<String> {
    argv(&["npm", "run", "lint"])
}

fn default_lint_fix() -> Vec<String> {
    argv(&["npm", "run", "lint", "--", "--fix"])
}

fn default_test_runner() -> Vec<String> {
    argv(&["npm", "test", "--", "{dir}"])
}

const SOURCE_GLOBS: &[&str] = &[
    "--include=*.js",
    "--include=*.jsx",
    "--include=*.mjs",
    "--include=*.cjs",
    "--include=*.ts",
    "--include=*.tsx",
    "--include=*.py",
    "--include=*.rs",
    "--include=*.go",
    "--include=*.java",
];

fn default_search() -> Vec<String> {
    let mut search = argv(&["grep", "-r", "-l", "-F"]);
    search.extend(argv(SOURCE_GLOBS));
    search.extend(argv(&[
        "--exclude-dir=node_modules",
        "--exclude-dir={reports}",
        "--",
        "{query}",
        ".",
    ]));
    search
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            build: default_build(),
            lint: default_lint(),
            lint_fix: default_lint_fix(),
            test_runner: default_test_runner(),
            search: default_search(),
        }
    }
}

/// Report storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportConfig {
    /// Directory receiving one JSON report per verification attempt
    #[serde(default = "default_report_dir")]
    pub directory: String,
}

fn default_report_dir() -> String {
    "./verification-reports".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: default_report_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
