//! Asynchronous job tracking for image-to-3D tasks.
//!
//! The 3D provider is pull-only: submitting a task returns an opaque id,
//! and the caller (normally a UI issuing `GET /api/status/{task_id}` once
//! a second) polls until a terminal state. This module models the job as
//! an explicit state machine — {Pending, InProgress, Succeeded, Failed} —
//! and provides a *bounded* server-side wait helper for callers that want
//! to block: the upstream protocol puts no limit on polling, so
//! [`PollPolicy::max_polls`] makes the bound explicit and a stuck job
//! surfaces as [`WedcardError::PollTimeout`] instead of spinning forever.
//!
//! Status reads are idempotent: polling a terminal job returns the same
//! snapshot every time, and stopping the loop needs no server-side
//! cancellation signal.

use crate::error::WedcardError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Interval and attempt bound for [`wait_for_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status reads.
    pub interval_ms: u64,
    /// Maximum status reads before giving up. Minimum 1.
    pub max_polls: u32,
}

impl Default for PollPolicy {
    /// 3 s × 200 polls ≈ 10 minutes, enough for typical mesh generation.
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            max_polls: 200,
        }
    }
}

/// Lifecycle state of an upstream job.
///
/// Upstream "CANCELED" is folded into `Failed` (with the cancellation
/// noted in the job's error message) so callers only ever see these four
/// states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Terminal states never change on subsequent polls.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Download URLs for a finished model, by format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usdz: Option<String>,
}

/// Upstream error report attached to a failed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskError {
    pub message: String,
}

/// One point-in-time snapshot of an upstream job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncJob {
    pub id: String,
    pub status: JobStatus,
    /// Completion percentage, 0–100.
    #[serde(default)]
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_urls: Option<ModelUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_error: Option<TaskError>,
}

impl AsyncJob {
    /// Artifact URL of the preferred (glb) format, present after success.
    pub fn glb_url(&self) -> Option<&str> {
        self.model_urls.as_ref().and_then(|u| u.glb.as_deref())
    }
}

/// Anything that can produce job snapshots for an id.
///
/// Implemented by [`crate::client::meshy::MeshyClient`]; tests script a
/// sequence of snapshots instead.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn snapshot(&self, task_id: &str) -> Result<AsyncJob, WedcardError>;
}

/// Poll `source` until the job reaches a terminal state, bounded by `policy`.
///
/// Returns the terminal snapshot — including `Failed` ones; callers decide
/// whether a failed job is an error. Exhausting the poll budget returns
/// [`WedcardError::PollTimeout`] with the last observed status.
pub async fn wait_for_job(
    source: &dyn JobSource,
    task_id: &str,
    policy: &PollPolicy,
) -> Result<AsyncJob, WedcardError> {
    let started = std::time::Instant::now();
    let max = policy.max_polls.max(1);
    let mut last_status = JobStatus::Pending;

    for poll in 1..=max {
        let job = source.snapshot(task_id).await?;
        debug!(task_id, status = %job.status, progress = job.progress, poll, "job snapshot");

        if job.status.is_terminal() {
            return Ok(job);
        }
        last_status = job.status;

        if poll < max {
            tokio::time::sleep(Duration::from_millis(policy.interval_ms)).await;
        }
    }

    Err(WedcardError::PollTimeout {
        task_id: task_id.to_string(),
        status: last_status.to_string(),
        polls: max,
        elapsed_secs: started.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Yields a scripted sequence of snapshots; repeats the last one.
    struct ScriptedSource {
        script: Mutex<Vec<AsyncJob>>,
    }

    impl ScriptedSource {
        fn new(mut script: Vec<AsyncJob>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl JobSource for ScriptedSource {
        async fn snapshot(&self, _task_id: &str) -> Result<AsyncJob, WedcardError> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                Ok(script.pop().unwrap())
            } else {
                Ok(script.last().cloned().unwrap())
            }
        }
    }

    fn job(status: JobStatus, progress: u8) -> AsyncJob {
        AsyncJob {
            id: "tsk_1".into(),
            status,
            progress,
            model_urls: None,
            task_error: None,
        }
    }

    #[tokio::test]
    async fn waits_through_to_success() {
        let source = ScriptedSource::new(vec![
            job(JobStatus::Pending, 0),
            job(JobStatus::InProgress, 40),
            AsyncJob {
                model_urls: Some(ModelUrls {
                    glb: Some("https://assets.example/model.glb".into()),
                    ..ModelUrls::default()
                }),
                ..job(JobStatus::Succeeded, 100)
            },
        ]);
        let policy = PollPolicy {
            interval_ms: 1,
            max_polls: 10,
        };
        let done = wait_for_job(&source, "tsk_1", &policy).await.unwrap();
        assert_eq!(done.status, JobStatus::Succeeded);
        assert_eq!(done.glb_url(), Some("https://assets.example/model.glb"));
    }

    #[tokio::test]
    async fn terminal_snapshot_is_idempotent() {
        let source = ScriptedSource::new(vec![job(JobStatus::Failed, 55)]);
        let first = source.snapshot("tsk_1").await.unwrap();
        let second = source.snapshot("tsk_1").await.unwrap();
        assert_eq!(first.status, second.status);
        assert_eq!(first.progress, second.progress);
    }

    #[tokio::test]
    async fn exhausted_budget_times_out() {
        let source = ScriptedSource::new(vec![job(JobStatus::InProgress, 10)]);
        let policy = PollPolicy {
            interval_ms: 1,
            max_polls: 3,
        };
        let err = wait_for_job(&source, "tsk_1", &policy).await.unwrap_err();
        match err {
            WedcardError::PollTimeout { polls, status, .. } => {
                assert_eq!(polls, 3);
                assert_eq!(status, "IN_PROGRESS");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn failed_jobs_are_terminal() {
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
    }

    #[test]
    fn status_round_trips_wire_spelling() {
        let s: JobStatus = serde_json::from_str("\"IN_PROGRESS\"").unwrap();
        assert_eq!(s, JobStatus::InProgress);
        assert_eq!(serde_json::to_string(&JobStatus::Pending).unwrap(), "\"PENDING\"");
    }
}
