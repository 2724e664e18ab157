//! OpenAI-compatible providers: chat completions for the OpenAI,
//! Groq, Nvidia and local Ollama families, plus OpenAI image
//! generation. All of them speak the same wire dialect; only base
//! URLs, credentials and defaults differ.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use futures::StreamExt;
use log::{debug, trace, error};

use crate::adapter::GenAdapter;
use crate::config::ProviderConfig;
use crate::error::Error;
use crate::params::{
  NamingTable,
  client_args,
  default_naming,
  model_args,
};
use crate::resultset::ResultSet;

const OPENAI_API_BASE: &str
  = "https://api.openai.com/v1";
const GROQ_API_BASE: &str
  = "https://api.groq.com/openai/v1";
const NVIDIA_API_BASE: &str
  = "https://integrate.api.nvidia.com/v1";
const OLLAMA_API_BASE: &str
  = "http://localhost:11434/v1";

/// Fixed diagnostic for unrecognized image generation payloads
const UNEXPECTED_IMAGE_RESPONSE: &str
  = "ERROR [IAIG-E030] Unexpected response type received from \
     image generation API.";

// ===== Wire Types =====

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse
{   choices: Vec<ChatChoice>
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice
{   message: ChatCompletionMessage
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionMessage
{   content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct ChatStreamChunk
{   choices: Vec<ChatStreamChoice>
}

#[derive(Debug, Clone, Deserialize)]
struct ChatStreamChoice
{   delta: ChatStreamDelta
}

#[derive(Debug, Clone, Deserialize)]
struct ChatStreamDelta
{   content: Option<String>
}

#[derive(Debug, Clone, Serialize)]
struct ImageGenRequest
{   #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>
  , prompt: String
  , n: u32
  , size: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct ImagesResponse
{   data: Vec<ImageEntry>
}

#[derive(Debug, Clone, Deserialize)]
struct ImageEntry
{   #[serde(default)]
    url: Option<String>
}

// ===== Shared Chat Transport =====

/// Issue a chat-completions request against any OpenAI-compatible
/// endpoint and normalize the outcome into the canonical envelope.
///
/// `model_params` is the for-wire canonical parameter map: the wire
/// body keys plus `provider`/`api_key`/`base_url`/`stop` surfaced
/// for client construction. Streaming responses are concatenated in
/// arrival order into the final text.
pub async fn openai_api_response(
  model_params: &Map<String, Value>
, naming: Option<&NamingTable>
) -> ResultSet
{   let default = default_naming();
    let naming = naming.unwrap_or(&default);

    let client_config = client_args(model_params, naming);
    let base_url = client_config.get("base_url")
      .and_then(Value::as_str)
      .unwrap_or(OPENAI_API_BASE);
    let api_key = client_config.get("api_key")
      .and_then(Value::as_str);

    let http_client = match reqwest::Client::builder().build()
    {   Ok(client) => client
      , Err(e) => {
          error!("Client construction failed: {}", e);
          return ResultSet::from_error(
            Error::Transport(e.to_string())
          );
        }
    };

    let model_config = model_args(model_params, naming, false);
    let stream = model_config.get("stream")
      .and_then(Value::as_bool)
      .unwrap_or(false);
    trace!(
      "openai_api_response | {} model_config: {:?}",
      model_params.get("provider")
        .and_then(Value::as_str)
        .unwrap_or("Provider N/A"),
      model_config
    );

    let mut request = http_client
      .post(format!("{}/chat/completions", base_url))
      .header("Content-Type", "application/json")
      .json(&model_config);
    if let Some(api_key) = api_key
    {   request = request.header(
          "Authorization",
          format!("Bearer {}", api_key)
        );
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
    trace!("openai_api_response | status: {}", status);
    if !status.is_success()
    {   let detail = model_response.text().await
          .unwrap_or_else(|_| "Unknown error".to_string());
        return ResultSet::from_error(Error::Status
        {   code: status.as_u16()
          , detail
        });
    }

    if stream
    {   accumulate_stream(model_response).await
    } else
    {   let chat_response: ChatCompletionResponse
          = match model_response.json().await
        {   Ok(parsed) => parsed
          , Err(e) => {
              error!("Parse error: {}", e);
              return ResultSet::from_error(
                Error::Shape(e.to_string())
              );
            }
        };
        match chat_response.choices.first()
          .and_then(|choice| choice.message.content.clone())
        {   Some(content) => ResultSet::with_text(content)
          , None => {
              error!("No choices in response");
              ResultSet::from_error(Error::Shape(
                "API response contained no choices".to_string()
              ))
            }
        }
    }
}

/// Concatenate SSE delta chunks in arrival order into the final
/// completion text
async fn accumulate_stream(
  model_response: reqwest::Response
) -> ResultSet
{   let mut body_stream = model_response.bytes_stream();
    let mut buffer = String::new();
    let mut content = String::new();
    let mut done = false;

    while let Some(chunk_result) = body_stream.next().await
    {   let chunk = match chunk_result
        {   Ok(chunk) => chunk
          , Err(e) => {
              error!("Streaming error: {}", e);
              return ResultSet::from_error(
                Error::Transport(e.to_string())
              );
            }
        };
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(split_idx) = buffer.find("\n\n")
        {   let event = buffer[..split_idx].to_string();
            buffer.drain(..split_idx + 2);

            for line in event.lines()
            {   if !line.starts_with("data:")
                {   continue;
                }
                let data = line.trim_start_matches("data:").trim();
                if data.is_empty()
                {   continue;
                }
                if data == "[DONE]"
                {   done = true;
                    break;
                }
                let parsed: ChatStreamChunk
                  = match serde_json::from_str(data)
                {   Ok(parsed) => parsed
                  , Err(e) => {
                      error!("Stream parse error: {}", e);
                      return ResultSet::from_error(
                        Error::Shape(e.to_string())
                      );
                    }
                };
                if let Some(delta) = parsed.choices.first()
                  .and_then(|choice| choice.delta.content.as_ref())
                {   content.push_str(delta);
                }
            }
            if done
            {   break;
            }
        }
        if done
        {   break;
        }
    }
    ResultSet::with_text(content)
}

// ===== Chat Family =====

/// OpenAI-compatible chat family membership: per-family base URLs
/// and environment fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFamily
{   OpenAi
  , Groq
  , Nvidia
  , Ollama
}

impl ChatFamily
{   pub fn from_provider(provider: crate::Provider)
      -> Option<Self>
    {   match provider
        {   crate::Provider::OpenAi => Some(ChatFamily::OpenAi)
          , crate::Provider::Groq => Some(ChatFamily::Groq)
          , crate::Provider::Nvidia => Some(ChatFamily::Nvidia)
          , crate::Provider::Ollama => Some(ChatFamily::Ollama)
          , _ => None
        }
    }

    fn default_base_url(&self) -> &'static str
    {   match self
        {   ChatFamily::OpenAi => OPENAI_API_BASE
          , ChatFamily::Groq => GROQ_API_BASE
          , ChatFamily::Nvidia => NVIDIA_API_BASE
          , ChatFamily::Ollama => OLLAMA_API_BASE
        }
    }

    fn api_key_env(&self) -> Option<&'static str>
    {   match self
        {   ChatFamily::OpenAi => Some("OPENAI_API_KEY")
          , ChatFamily::Groq => Some("GROQ_API_KEY")
          , ChatFamily::Nvidia => Some("NVIDIA_API_KEY")
          , ChatFamily::Ollama => None
        }
    }

    fn model_env(&self) -> &'static str
    {   match self
        {   ChatFamily::OpenAi => "OPENAI_MODEL"
          , ChatFamily::Groq => "GROQ_MODEL"
          , ChatFamily::Nvidia => "NVIDIA_MODEL"
          , ChatFamily::Ollama => "OLLAMA_MODEL"
        }
    }
}

// ===== Chat Adapter =====

/// Chat adapter for every OpenAI-compatible provider family
pub struct OpenaiCompatLlm
{   config: ProviderConfig
  , family: ChatFamily
}

impl OpenaiCompatLlm
{   pub fn new(family: ChatFamily, config: ProviderConfig) -> Self
    {   debug!(
          "Creating OpenaiCompatLlm for: {}",
          config.provider
        );
        OpenaiCompatLlm
        {   config
          , family
        }
    }

    fn resolved_api_key(&self) -> Option<String>
    {   self.config.api_key.clone()
          .or_else(|| {
            self.family.api_key_env()
              .and_then(|name| std::env::var(name).ok())
          })
    }

    fn resolved_model(&self) -> Option<String>
    {   self.config.model_name.clone()
          .or_else(|| {
            std::env::var(self.family.model_env()).ok()
          })
    }

    fn resolved_base_url(&self) -> String
    {   self.config.base_url.clone()
          .unwrap_or_else(|| {
            self.family.default_base_url().to_string()
          })
    }
}

#[async_trait::async_trait]
impl GenAdapter for OpenaiCompatLlm
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
        if let Some(api_key) = self.resolved_api_key()
        {   additional_params.insert(
              "api_key".to_string(),
              Value::String(api_key)
            );
        }
        if let Some(model) = self.resolved_model()
        {   additional_params.insert(
              "model".to_string(),
              Value::String(model)
            );
        }
        additional_params.insert(
          "base_url".to_string(),
          Value::String(self.resolved_base_url())
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
        debug!(
          "openai_query | model_params: {:?}",
          model_params
        );
        let mut response = openai_api_response(
          &model_params,
          Some(&self.config.naming),
        ).await;
        response.refined_prompt = bundle.refined_prompt;
        debug!("openai_query | response: {:?}", response);
        response
    }
}

// ===== Image Generation Adapter =====

/// OpenAI image generation (DALL-E style images endpoint)
pub struct OpenaiImageGen
{   config: ProviderConfig
}

impl OpenaiImageGen
{   pub fn new(config: ProviderConfig) -> Self
    {   debug!(
          "Creating OpenaiImageGen for: {}",
          config.provider
        );
        OpenaiImageGen
        {   config
        }
    }

    fn resolved_api_key(&self) -> Option<String>
    {   self.config.api_key.clone()
          .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    fn resolved_model(&self) -> Option<String>
    {   self.config.model_name.clone()
          .or_else(|| {
            std::env::var("OPENAI_IMAGE_GEN_MODEL").ok()
          })
    }
}

#[async_trait::async_trait]
impl GenAdapter for OpenaiImageGen
{   fn config(&self) -> &ProviderConfig
    {   &self.config
    }

    /// Text queries (the enhancement pass included) ride on the
    /// OpenAI chat adapter with the same configuration
    async fn query(
      &self
    , system_prompt: Option<&str>
    , user_input: &str
    , enhancement_text: Option<&str>
    , unified: bool
    ) -> ResultSet
    {   OpenaiCompatLlm::new(
          ChatFamily::OpenAi,
          self.config.clone(),
        ).query(
          system_prompt,
          user_input,
          enhancement_text,
          unified,
        ).await
    }

    async fn image_gen(
      &self
    , user_input: &str
    , enhancement_text: Option<&str>
    , image_extension: &str
    ) -> ResultSet
    {   // The extension only matters to providers that return raw
        // bytes; this endpoint answers with hosted URLs
        let _ = image_extension;
        let bundle = match self.prompts_and_messages(
          Some(""),
          user_input,
          enhancement_text,
          true,
        ).await
        {   Ok(bundle) => bundle
          , Err(resultset) => return resultset
        };

        let ig_request = ImageGenRequest
        {   model: self.resolved_model()
          , prompt: bundle.user_input.clone()
          , n: 1
          , size: self.config.params.get("size")
              .and_then(Value::as_str)
              .unwrap_or("1024x1024")
              .to_string()
          , quality: self.config.params.get("quality")
              .and_then(Value::as_str)
              .map(str::to_string)
        };
        debug!(
          "openai_image_gen | model_params: {:?}",
          ig_request
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
        let base_url = self.config.base_url.clone()
          .unwrap_or_else(|| OPENAI_API_BASE.to_string());
        let mut request = http_client
          .post(format!("{}/images/generations", base_url))
          .header("Content-Type", "application/json")
          .json(&ig_request);
        if let Some(api_key) = self.resolved_api_key()
        {   request = request.header(
              "Authorization",
              format!("Bearer {}", api_key)
            );
        }

        let ig_response = match request.send().await
        {   Ok(response) => response
          , Err(e) => {
              error!("HTTP error: {}", e);
              return ResultSet::from_error(
                Error::Transport(e.to_string())
              );
            }
        };

        let status = ig_response.status();
        trace!("openai_image_gen | status: {}", status);
        if !status.is_success()
        {   let detail = ig_response.text().await
              .unwrap_or_else(|_| "Unknown error".to_string());
            let mut resultset = ResultSet::from_error(
              Error::Status
              {   code: status.as_u16()
                , detail
              }
            );
            resultset.refined_prompt = bundle.refined_prompt;
            return resultset;
        }

        let mut resultset
          = match ig_response.json::<ImagesResponse>().await
        {   Ok(parsed) => {
              let image_urls: Vec<String> = parsed.data
                .iter()
                .filter_map(|image| image.url.clone())
                .collect();
              ResultSet::with_urls(image_urls)
            }
          , Err(e) => {
              error!("Unexpected image response: {}", e);
              ResultSet::from_error(Error::Shape(
                UNEXPECTED_IMAGE_RESPONSE.to_string()
              ))
            }
        };
        resultset.refined_prompt = bundle.refined_prompt;
        debug!("openai_image_gen | response: {:?}", resultset);
        resultset
    }
}
