//! Task domain model.
//!
//! A task is the unit of claimed work submitted for verification. The caller
//! owns everything except [`VerificationMetadata`], which the orchestrator
//! attaches when the task is queued.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::CheckKind;

/// HTTP endpoint the task claims to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Absolute URL to probe.
    pub url: String,
    /// HTTP method, `GET` when omitted.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Endpoint {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A declared behavior with a script that demonstrates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    pub name: String,
    /// Shell snippet whose output is matched against `expected_output`.
    #[serde(default)]
    pub test_script: Option<String>,
    #[serde(default = "default_expected_output")]
    pub expected_output: String,
}

fn default_expected_output() -> String {
    "success".to_string()
}

/// A performance bound the task claims to meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRequirement {
    /// Metric name, e.g. `startup_ms`.
    pub name: String,
    /// Upper bound for the measured value.
    pub threshold: f64,
    /// Command whose wall-clock duration (ms) is the measured value.
    #[serde(default)]
    pub command: Option<String>,
}

/// A claim made about the work, with its own validation metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub description: String,
    #[serde(default)]
    pub impossible: bool,
    #[serde(default)]
    pub contradictory: bool,
    #[serde(default)]
    pub validation_error: Option<String>,
}

impl Claim {
    /// A claim is valid unless its metadata marks it impossible or contradictory.
    pub fn is_valid(&self) -> bool {
        !self.impossible && !self.contradictory
    }
}

/// Metadata appended by the orchestrator on enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMetadata {
    pub required_checks: Vec<CheckKind>,
    pub queued_at: DateTime<Utc>,
    pub enriched_at: DateTime<Utc>,
}

/// A unit of claimed work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Caller- or system-assigned identifier. Empty until enrichment when the
    /// caller does not provide one.
    #[serde(default)]
    pub id: String,
    pub description: String,
    /// Files the work is expected to have produced.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub expected_directories: Vec<PathBuf>,
    /// Shell command that exercises the feature.
    #[serde(default)]
    pub test_command: Option<String>,
    #[serde(default)]
    pub test_directory: Option<PathBuf>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub behaviors: Vec<Behavior>,
    #[serde(default)]
    pub performance_requirements: Vec<PerformanceRequirement>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    /// Set to `false` to waive the build step of the integration check.
    #[serde(default = "default_true")]
    pub requires_build: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationMetadata>,
}

const fn default_true() -> bool {
    true
}

impl Task {
    /// Create a task with only a description; every hint empty.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            description: description.into(),
            files: Vec::new(),
            expected_directories: Vec::new(),
            test_command: None,
            test_directory: None,
            endpoints: Vec::new(),
            behaviors: Vec::new(),
            performance_requirements: Vec::new(),
            claims: Vec::new(),
            requires_build: true,
            verification: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn with_expected_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.expected_directories.push(path.into());
        self
    }

    pub fn with_test_command(mut self, command: impl Into<String>) -> Self {
        self.test_command = Some(command.into());
        self
    }

    pub fn with_test_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_directory = Some(path.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn with_performance_requirement(mut self, requirement: PerformanceRequirement) -> Self {
        self.performance_requirements.push(requirement);
        self
    }

    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims.push(claim);
        self
    }

    pub fn without_build(mut self) -> Self {
        self.requires_build = false;
        self
    }

    /// Fill in the identifier when absent and attach verification metadata.
    ///
    /// Caller-owned fields are left untouched.
    pub fn enrich(mut self) -> Self {
        if self.id.trim().is_empty() {
            self.id = generate_task_id();
        }
        let now = Utc::now();
        self.verification = Some(VerificationMetadata {
            required_checks: CheckKind::REQUIRED.to_vec(),
            queued_at: now,
            enriched_at: now,
        });
        self
    }

    /// When the task was queued, if it went through the queue.
    pub fn queued_at(&self) -> Option<DateTime<Utc>> {
        self.verification.as_ref().map(|m| m.queued_at)
    }
}

/// Generate a task identifier of the form `task-<uuid>`.
pub fn generate_task_id() -> String {
    format!("task-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_assigns_missing_id() {
        let task = Task::new("Add a parser").enrich();
        assert!(task.id.starts_with("task-"));
        let metadata = task.verification.expect("metadata attached");
        assert_eq!(metadata.required_checks, CheckKind::REQUIRED.to_vec());
    }

    #[test]
    fn test_enrich_keeps_caller_fields() {
        let original = Task::new("Add src/lib.rs")
            .with_id("t-1")
            .with_test_command("cargo test")
            .without_build();
        let enriched = original.clone().enrich();

        assert_eq!(enriched.id, "t-1");
        assert_eq!(enriched.description, original.description);
        assert_eq!(enriched.test_command, original.test_command);
        assert!(!enriched.requires_build);
        assert!(enriched.queued_at().is_some());
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = r"
description: Implement the login endpoint
endpoints:
  - url: http://localhost:3000/login
behaviors:
  - name: rejects bad password
    test_script: ./scripts/bad_password.sh
claims:
  - description: Handles a billion requests per second
    impossible: true
";
        let task: Task = serde_yaml::from_str(yaml).expect("task parses");
        assert!(task.id.is_empty());
        assert!(task.requires_build);
        assert_eq!(task.endpoints[0].method, "GET");
        assert_eq!(task.behaviors[0].expected_output, "success");
        assert!(!task.claims[0].is_valid());
    }
}
