//! Bounded submit-then-poll state machine for providers whose
//! generation is asynchronous (long-running video jobs).
//!
//! Timeout semantics are attempt-count-based, never wall-clock: the
//! loop issues at most `max_attempts` status checks with a fixed
//! sleep between them. Cancellation is the async-native kind: the
//! caller drops the future (tokio::select!/timeout) and the loop
//! stops at the next await point.

use std::future::Future;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::{debug, error, info};

use crate::error::Error;
use crate::resultset::ResultSet;

/// Default status-check budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default sleep between status checks, in seconds
pub const DEFAULT_WAIT_SECONDS: u64 = 60;

/// Status-field values providers use to signal success
pub const SUCCESS_TOKENS: [&str; 3]
  = ["success", "Success", "成功"];

/// Whether a status token is one of the recognized success markers
pub fn is_success_token(message: &str) -> bool
{   SUCCESS_TOKENS.contains(&message)
}

/// Polling budget configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy
{   pub max_attempts: u32
  , pub wait_seconds: u64
}

impl Default for PollPolicy
{   fn default() -> Self
    {   PollPolicy
        {   max_attempts: DEFAULT_MAX_ATTEMPTS
          , wait_seconds: DEFAULT_WAIT_SECONDS
        }
    }
}

impl PollPolicy
{   /// Default attempt budget with a caller-chosen wait interval
    pub fn with_wait(wait_seconds: u64) -> Self
    {   PollPolicy
        {   wait_seconds
          , ..PollPolicy::default()
        }
    }
}

/// Lifecycle of a submitted generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState
{   Submitted
  , Polling
  , Succeeded
  , Failed
}

/// A submitted asynchronous generation job. Created after a
/// successful submission call returns a request id; mutated only by
/// the poller; discarded once terminal (persistence is the caller's
/// responsibility).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncJob
{   pub request_id: String
  , pub status: JobState
  , pub video_url: Option<String>
  , pub attempts: u32
  , pub max_attempts: u32
  , pub wait_seconds: u64
}

impl AsyncJob
{   pub fn new(
      request_id: impl Into<String>
    , policy: PollPolicy
    ) -> Self
    {   AsyncJob
        {   request_id: request_id.into()
          , status: JobState::Submitted
          , video_url: None
          , attempts: 0
          , max_attempts: policy.max_attempts
          , wait_seconds: policy.wait_seconds
        }
    }
}

/// Drive a submitted job to a terminal state.
///
/// Each iteration issues one status check through `check`:
/// * a check that reports an error envelope fails the job at once,
///   with no further retries;
/// * a success token together with a non-empty result payload
///   succeeds the job on that same iteration, without sleeping;
/// * anything else sleeps `wait_seconds` and retries, until the
///   attempt budget is spent and the job fails with the exhaustion
///   error referencing the request id and the last observed
///   response.
pub async fn follow_up<F, Fut>(
  job: &mut AsyncJob
, check: F
) -> ResultSet
  where
    F: Fn() -> Fut
  , Fut: Future<Output = ResultSet>
{   job.status = JobState::Polling;
    let mut last_response = ResultSet::default();

    for attempt in 0..job.max_attempts
    {   job.attempts = attempt + 1;
        debug!(
          "follow_up | request_id: {} | VERIFICATION TRY {}",
          job.request_id, attempt
        );
        let response = check().await;
        debug!(
          "follow_up | VERIFICATION {} | response: {:?}",
          attempt, response
        );
        if response.error
        {   error!(
              "follow_up | status check failed for request_id: {}",
              job.request_id
            );
            job.status = JobState::Failed;
            return response;
        }
        let completed_url = response.job().and_then(|status| {
          let succeeded = status.message.as_deref()
            .map(is_success_token)
            .unwrap_or(false);
          status.data.clone()
            .filter(|data| succeeded && !data.is_empty())
        });
        if let Some(video_url) = completed_url
        {   info!(
              "follow_up | request_id: {} succeeded after {} attempts",
              job.request_id, job.attempts
            );
            job.status = JobState::Succeeded;
            job.video_url = Some(video_url.clone());
            let mut resultset = response;
            resultset.video_url = Some(video_url);
            return resultset;
        }
        last_response = response;
        tokio::time::sleep(
          Duration::from_secs(job.wait_seconds)
        ).await;
    }

    job.status = JobState::Failed;
    ResultSet::from_error(Error::Exhausted
    {   request_id: job.request_id.clone()
      , last_response: serde_json::to_string(&last_response)
          .unwrap_or_else(|_| format!("{:?}", last_response))
    })
}
