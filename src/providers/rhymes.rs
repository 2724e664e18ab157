//! Rhymes AI providers: Aria chat models through the
//! OpenAI-compatible wire, and Allegro text-to-video with its
//! submit-then-poll generation protocol.

use std::time::{SystemTime, UNIX_EPOCH};
use serde_json::{Map, Value, json};
use log::{debug, trace, error};

use crate::adapter::GenAdapter;
use crate::config::ProviderConfig;
use crate::error::Error;
use crate::params::model_args;
use crate::poller::{self, AsyncJob, PollPolicy, is_success_token};
use crate::providers::openai::openai_api_response;
use crate::resultset::{JobStatus, ResultSet};

const RHYMES_API_BASE: &str
  = "https://api.rhymes.ai/v1";
/// Aria models emit this marker at the end of a turn
const ARIA_STOP_SEQUENCE: &str = "<|im_end|>";
/// The Allegro endpoints expect this agent string
const ALLEGRO_USER_AGENT: &str
  = "Apifox/1.0.0 (https://apifox.com)";

// ===== Aria Chat Adapter =====

/// Aria LLM chat adapter
pub struct AriaLlm
{   config: ProviderConfig
}

impl AriaLlm
{   pub fn new(config: ProviderConfig) -> Self
    {   debug!("Creating AriaLlm for: {}", config.provider);
        AriaLlm
        {   config
        }
    }
}

#[async_trait::async_trait]
impl GenAdapter for AriaLlm
{   fn config(&self) -> &ProviderConfig
    {   &self.config
    }

    async fn query(
      &self
    , system_prompt: Option<&str>
    , user_input: &str
    , enhancement_text: Option<&str>
    , unified: bool
    ) -> ResultSet
    {   let bundle = match self.prompts_and_messages(
          system_prompt,
          user_input,
          enhancement_text,
          unified,
        ).await
        {   Ok(bundle) => bundle
          , Err(resultset) => return resultset
        };

        let mut additional_params = Map::new();
        if let Some(model) = self.config.model_name.clone()
          .or_else(|| std::env::var("RHYMES_MODEL_NAME").ok())
        {   additional_params.insert(
              "model".to_string(),
              Value::String(model)
            );
        }
        if let Some(api_key) = self.config.api_key.clone()
          .or_else(|| std::env::var("RHYMES_ARIA_API_KEY").ok())
        {   additional_params.insert(
              "api_key".to_string(),
              Value::String(api_key)
            );
        }
        additional_params.insert(
          "base_url".to_string(),
          Value::String(
            self.config.base_url.clone()
              .unwrap_or_else(|| RHYMES_API_BASE.to_string())
          )
        );
        additional_params.insert(
          "stop".to_string(),
          json!([ARIA_STOP_SEQUENCE])
        );
        additional_params.insert(
          "messages".to_string(),
          json!(bundle.messages)
        );

        let model_params = model_args(
          &self.config.merged_params(additional_params),
          &self.config.naming,
          true,
        );
        debug!("aria_query | model_params: {:?}", model_params);
        let mut response = openai_api_response(
          &model_params,
          Some(&self.config.naming),
        ).await;
        response.refined_prompt = bundle.refined_prompt;
        debug!("aria_query | response: {:?}", response);
        response
    }
}

// ===== Allegro Video Adapter =====

/// One HTTP call against an Allegro endpoint
#[derive(Debug, Clone)]
struct AllegroCall
{   api_key: Option<String>
  , url: String
  , method: reqwest::Method
  , query: Vec<(String, String)>
  , payload: Option<Value>
}

/// Allegro text-to-video adapter. Generation is asynchronous:
/// submission returns a request id, completion is observed through
/// the bounded status-poll loop.
pub struct AllegroLlm
{   config: ProviderConfig
}

impl AllegroLlm
{   pub fn new(config: ProviderConfig) -> Self
    {   debug!("Creating AllegroLlm for: {}", config.provider);
        AllegroLlm
        {   config
        }
    }

    fn resolved_api_key(&self) -> Option<String>
    {   self.config.api_key.clone()
          .or_else(|| {
            std::env::var("RHYMES_ALLEGRO_API_KEY").ok()
          })
    }

    fn base_url(&self) -> String
    {   self.config.base_url.clone()
          .unwrap_or_else(|| RHYMES_API_BASE.to_string())
    }

    fn poll_policy(&self, wait_seconds: u64) -> PollPolicy
    {   let max_attempts = self.config.params.get("max_attempts")
          .and_then(|value| match value
          {   Value::Number(number) => number.as_u64()
            , Value::String(text) => text.parse::<u64>().ok()
            , _ => None
          })
          .map(|attempts| attempts as u32)
          .unwrap_or(poller::DEFAULT_MAX_ATTEMPTS);
        PollPolicy
        {   max_attempts
          , wait_seconds
        }
    }

    /// Issue one Allegro endpoint call and parse the submit/poll
    /// status shape
    async fn allegro_query(&self, call: &AllegroCall)
      -> ResultSet
    {   debug!(
          "allegro_query | URL: {} | method: {} | payload: {:?}",
          call.url, call.method, call.payload
        );
        let http_client = match reqwest::Client::builder().build()
        {   Ok(client) => client
          , Err(e) => {
              error!("Client construction failed: {}", e);
              return ResultSet::from_error(
                Error::Transport(e.to_string())
              );
            }
        };

        let mut request = http_client
          .request(call.method.clone(), &call.url)
          .header("User-Agent", ALLEGRO_USER_AGENT);
        if let Some(api_key) = &call.api_key
        {   request = request.header("Authorization", api_key);
        }
        if !call.query.is_empty()
        {   request = request.query(&call.query);
        }
        if let Some(payload) = &call.payload
        {   request = request
              .header("Content-Type", "application/json")
              .json(payload);
        }

        let model_response = match request.send().await
        {   Ok(response) => response
          , Err(e) => {
              error!("HTTP error: {}", e);
              return ResultSet::from_error(
                Error::Transport(e.to_string())
              );
            }
        };

        let status = model_response.status();
        trace!("allegro_query | status: {}", status);
        if !status.is_success()
        {   return ResultSet::from_error(Error::Status
            {   code: status.as_u16()
              , detail: String::new()
            });
        }

        match model_response.json::<JobStatus>().await
        {   Ok(job_status) => {
              trace!(
                "allegro_query | API response: {:?}",
                job_status
              );
              ResultSet::with_job(job_status)
            }
          , Err(e) => {
              error!("Parse error: {}", e);
              ResultSet::from_error(Error::Shape(e.to_string()))
            }
        }
    }
}

#[async_trait::async_trait]
impl GenAdapter for AllegroLlm
{   fn config(&self) -> &ProviderConfig
    {   &self.config
    }

    /// Text queries (the enhancement pass included) ride on the
    /// Aria chat adapter; this adapter's own model is the video
    /// model
    async fn query(
      &self
    , system_prompt: Option<&str>
    , user_input: &str
    , enhancement_text: Option<&str>
    , unified: bool
    ) -> ResultSet
    {   let provider = std::env::var("LLM_PROVIDER")
          .unwrap_or_else(|_| "rhymes".to_string());
        let mut delegate_config = ProviderConfig::new(provider);
        delegate_config.base_url = self.config.base_url.clone();
        AriaLlm::new(delegate_config).query(
          system_prompt,
          user_input,
          enhancement_text,
          unified,
        ).await
    }

    async fn video_gen(
      &self
    , user_input: &str
    , enhancement_text: Option<&str>
    ) -> ResultSet
    {   let api_key = match self.resolved_api_key()
        {   Some(api_key) => api_key
          , None => {
              return ResultSet::from_error(
                Error::MissingApiKey("rhymes:allegro".to_string())
              );
            }
        };
        let bundle = match self.prompts_and_messages(
          None,
          user_input,
          enhancement_text,
          false,
        ).await
        {   Ok(bundle) => bundle
          , Err(resultset) => return resultset
        };

        let rand_seed = SystemTime::now()
          .duration_since(UNIX_EPOCH)
          .map(|elapsed| elapsed.as_secs())
          .unwrap_or_default();
        let call = AllegroCall
        {   api_key: Some(api_key)
          , url: format!("{}/generateVideoSyn", self.base_url())
          , method: reqwest::Method::POST
          , query: Vec::new()
          , payload: Some(json!(
            {   "refined_prompt": bundle.refined_prompt.clone()
              , "user_prompt": user_input
              , "num_step": 50
              , "rand_seed": rand_seed
              , "cfg_scale": 7.5
            }))
        };
        debug!(
          "allegro_request_video | GENERATE VIDEO | call: {:?}",
          call
        );

        let mut response = self.allegro_query(&call).await;
        response.refined_prompt = bundle.refined_prompt;
        debug!(
          "allegro_request_video | GENERATION RESULT | \
           response: {:?}",
          response
        );
        if response.error
        {   return response;
        }

        // Submission succeeds only with a success token and a
        // request id to poll
        let failure_message = match response.job()
        {   Some(job_status) => {
              let message_bad = job_status.message.as_deref()
                .map(|message| !is_success_token(message))
                .unwrap_or(false);
              let has_data = job_status.data.as_deref()
                .map(|data| !data.is_empty())
                .unwrap_or(false);
              if message_bad || !has_data
              {   Some(job_status.message.clone()
                    .unwrap_or_else(|| {
                      "No message and no data".to_string()
                    }))
              } else
              {   None
              }
            }
          , None => Some("No message and no data".to_string())
        };
        if let Some(message) = failure_message
        {   error!(
              "allegro_request_video | submission failed: {}",
              message
            );
            response.error = true;
            response.error_message = message;
        }
        response
    }

    async fn video_gen_followup(
      &self
    , submission: &ResultSet
    , wait_seconds: u64
    ) -> ResultSet
    {   let request_id = match submission.job()
          .and_then(|job_status| job_status.data.clone())
          .filter(|request_id| !request_id.is_empty())
        {   Some(request_id) => request_id
          , None => {
              return ResultSet::from_error(Error::Shape(
                "Submission response carried no request id"
                  .to_string()
              ));
            }
        };
        let api_key = match self.resolved_api_key()
        {   Some(api_key) => api_key
          , None => {
              return ResultSet::from_error(
                Error::MissingApiKey("rhymes:allegro".to_string())
              );
            }
        };
        debug!(
          "allegro_check_video_generation | request_id: {}",
          request_id
        );

        let call = AllegroCall
        {   api_key: Some(api_key)
          , url: format!("{}/videoQuery", self.base_url())
          , method: reqwest::Method::GET
          , query: vec![
              ("requestId".to_string(), request_id.clone())
            ]
          , payload: None
        };
        debug!(
          "allegro_check_video_generation | WAIT FOR VIDEO | \
           call: {:?}",
          call
        );

        let mut job = AsyncJob::new(
          request_id,
          self.poll_policy(wait_seconds),
        );
        poller::follow_up(
          &mut job,
          || self.allegro_query(&call),
        ).await
    }
}
