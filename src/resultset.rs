//! Canonical result envelope returned by every public operation

use serde::{Deserialize, Serialize};
use log::error;

/// Payload carried by a resultset, parsed into its canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody
{   /// No payload (default, and for pure error envelopes)
    Empty
  , /// Completion text (chat/enhancement results)
    Text(String)
  , /// Ordered list of generated artifact URLs (image generation)
    Urls(Vec<String>)
  , /// Submit/poll job status payload (video generation)
    Job(JobStatus)
}

impl Default for ResponseBody
{   fn default() -> Self
    {   ResponseBody::Empty
    }
}

/// Explicit parse of the provider submit/poll wire shape:
/// `message` holds a status token, `data` holds the request id
/// (submission) or the artifact URL (status check)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus
{   #[serde(default)]
    pub message: Option<String>
  , #[serde(default)]
    pub data: Option<String>
}

/// Universal return/error envelope for all adapter operations.
/// Expected-failure conditions never escape as Err from a public
/// entry point; they are converted into this shape instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet
{   pub error: bool
  , pub error_message: String
  , pub response: ResponseBody
  , pub refined_prompt: Option<String>
  , pub video_url: Option<String>
}

impl Default for ResultSet
{   fn default() -> Self
    {   ResultSet
        {   error: false
          , error_message: String::new()
          , response: ResponseBody::Empty
          , refined_prompt: None
          , video_url: None
        }
    }
}

impl ResultSet
{   /// Success envelope carrying completion text
    pub fn with_text(text: String) -> Self
    {   ResultSet
        {   response: ResponseBody::Text(text)
          , ..ResultSet::default()
        }
    }

    /// Success envelope carrying generated artifact URLs
    pub fn with_urls(urls: Vec<String>) -> Self
    {   ResultSet
        {   response: ResponseBody::Urls(urls)
          , ..ResultSet::default()
        }
    }

    /// Success envelope carrying a submit/poll status payload
    pub fn with_job(job: JobStatus) -> Self
    {   ResultSet
        {   response: ResponseBody::Job(job)
          , ..ResultSet::default()
        }
    }

    /// Convert a taxonomy error into the canonical envelope
    pub fn from_error(err: crate::error::Error) -> Self
    {   error!("Returning error resultset: {}", err);
        ResultSet
        {   error: true
          , error_message: err.to_string()
          , ..ResultSet::default()
        }
    }

    /// The completion text, when the payload carries one
    pub fn text(&self) -> Option<&str>
    {   match &self.response
        {   ResponseBody::Text(text) => Some(text)
          , _ => None
        }
    }

    /// The job status payload, when the payload carries one
    pub fn job(&self) -> Option<&JobStatus>
    {   match &self.response
        {   ResponseBody::Job(job) => Some(job)
          , _ => None
        }
    }
}
