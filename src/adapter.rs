//! The polymorphic provider adapter contract.
//!
//! One implementation per provider family; each performs the actual
//! network call, interprets the provider's success/failure shape and
//! returns the canonical resultset envelope. Composition and prompt
//! enhancement are provided methods so every adapter shares the
//! exact same request preparation.

use async_trait::async_trait;
use log::debug;

use crate::compose::messages_array;
use crate::config::ProviderConfig;
use crate::enhance::{
  DEFAULT_PROMPT_ENHANCEMENT_TEXT,
  clean_refined_prompt,
};
use crate::error::Error;
use crate::request::{CanonicalRequest, Message};
use crate::resultset::{ResponseBody, ResultSet};

/// Outcome of the request-preparation pass: the (possibly enhanced)
/// prompt/input pair and the composed message sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBundle
{   pub system_prompt: Option<String>
  , pub user_input: String
  , pub refined_prompt: Option<String>
  , pub messages: Vec<Message>
}

/// Capability-typed provider adapter. Text adapters implement
/// `query`; image and video adapters additionally override their
/// capability methods. Unimplemented capabilities answer with a
/// configuration-error envelope instead of panicking.
#[async_trait]
pub trait GenAdapter: Send + Sync
{   /// The configuration this adapter was constructed with
    fn config(&self) -> &ProviderConfig;

    /// Perform a text query against the provider
    async fn query(
      &self
    , system_prompt: Option<&str>
    , user_input: &str
    , enhancement_text: Option<&str>
    , unified: bool
    ) -> ResultSet;

    /// Perform an image generation request
    async fn image_gen(
      &self
    , user_input: &str
    , enhancement_text: Option<&str>
    , image_extension: &str
    ) -> ResultSet
    {   let _ = (user_input, enhancement_text, image_extension);
        ResultSet::from_error(Error::Configuration(format!(
          "Provider {} does not support image generation",
          self.config().provider
        )))
    }

    /// Submit a video generation request
    async fn video_gen(
      &self
    , user_input: &str
    , enhancement_text: Option<&str>
    ) -> ResultSet
    {   let _ = (user_input, enhancement_text);
        ResultSet::from_error(Error::Configuration(format!(
          "Provider {} does not support video generation",
          self.config().provider
        )))
    }

    /// Poll a submitted video generation request to completion
    async fn video_gen_followup(
      &self
    , submission: &ResultSet
    , wait_seconds: u64
    ) -> ResultSet
    {   let _ = (submission, wait_seconds);
        ResultSet::from_error(Error::Configuration(format!(
          "Provider {} does not support video generation",
          self.config().provider
        )))
    }

    /// Dispatch a canonical request through `query`
    async fn execute(&self, request: &CanonicalRequest)
      -> ResultSet
    {   self.query(
          request.system_prompt.as_deref(),
          &request.user_input,
          request.enhancement_text.as_deref(),
          request.unified,
        ).await
    }

    /// Rewrite `question` through a secondary LLM call and strip the
    /// label artifacts the underlying model tends to prepend. The
    /// inner adapter's error envelope propagates unchanged.
    async fn prompt_enhancer(
      &self
    , question: &str
    , enhancement_text: Option<&str>
    ) -> ResultSet
    {   let enhancement_text = match enhancement_text
        {   Some(text) if !text.is_empty() => text
          , _ => DEFAULT_PROMPT_ENHANCEMENT_TEXT
        };
        debug!(
          "prompt_enhancer | enhancement_text: {}",
          enhancement_text
        );
        let llm_response = self.query(
          Some(enhancement_text),
          question,
          None,
          false,
        ).await;
        debug!(
          "prompt_enhancer | llm_response: {:?}",
          llm_response
        );
        if llm_response.error
        {   return llm_response;
        }
        let refined_prompt = match llm_response.text()
        {   Some(text) => clean_refined_prompt(text)
          , None => {
              return ResultSet::from_error(Error::Shape(
                "Enhancement response carried no text".to_string()
              ));
            }
        };
        ResultSet::with_text(refined_prompt)
    }

    /// Request preparation: optional enhancement pass, then message
    /// composition. With a system prompt present only the system
    /// prompt is enhanced; otherwise the user input itself is. The
    /// refined prompt is reported only when it differs from the
    /// original. An enhancement failure short-circuits with the
    /// ready-to-return error envelope.
    async fn prompts_and_messages(
      &self
    , system_prompt: Option<&str>
    , user_input: &str
    , enhancement_text: Option<&str>
    , unified: bool
    ) -> Result<PromptBundle, ResultSet>
    {   let mut system_prompt = system_prompt
          .filter(|prompt| !prompt.is_empty())
          .map(str::to_string);
        let mut user_input = user_input.to_string();
        let mut refined_prompt = None;

        let enhancement_text = enhancement_text
          .filter(|text| !text.is_empty());
        if let Some(enhancement) = enhancement_text
        {   if let Some(prompt) = &system_prompt
            {   // Refine only the system prompt
                let llm_response = self.prompt_enhancer(
                  prompt,
                  Some(enhancement),
                ).await;
                if llm_response.error
                {   return Err(llm_response);
                }
                let enhanced = extract_text(&llm_response)?;
                if enhanced != *prompt
                {   refined_prompt = Some(enhanced.clone());
                }
                system_prompt = Some(enhanced);
            } else if !user_input.is_empty()
            {   // No system prompt, so the user input has or is the
                // prompt
                let llm_response = self.prompt_enhancer(
                  &user_input,
                  Some(enhancement),
                ).await;
                if llm_response.error
                {   return Err(llm_response);
                }
                let enhanced = extract_text(&llm_response)?;
                if enhanced != user_input
                {   refined_prompt = Some(enhanced.clone());
                }
                user_input = enhanced;
            }
        }

        let messages = messages_array(
          system_prompt.as_deref(),
          &user_input,
          unified,
        );
        Ok(PromptBundle
        {   system_prompt
          , user_input
          , refined_prompt
          , messages
        })
    }
}

fn extract_text(resultset: &ResultSet)
  -> Result<String, ResultSet>
{   match &resultset.response
    {   ResponseBody::Text(text) => Ok(text.clone())
      , _ => Err(ResultSet::from_error(Error::Shape(
          "Enhancement response carried no text".to_string()
        )))
    }
}
