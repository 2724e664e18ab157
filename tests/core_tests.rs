use std::sync::atomic::{AtomicUsize, Ordering};
use serde_json::{Map, Value, json};

use allgen::compose::messages_array;
use allgen::enhance::clean_refined_prompt;
use allgen::error::Error;
use allgen::params::{default_naming, model_args};
use allgen::poller::{
  self,
  AsyncJob,
  JobState,
  PollPolicy,
  is_success_token,
};
use allgen::request::Role;
use allgen::resultset::{JobStatus, ResponseBody, ResultSet};
use allgen::{GenCapability, ProviderConfig};

fn init_logs()
{   let _ = env_logger::builder().is_test(true).try_init();
}

// ===== Message Composition =====

#[test]
fn test_compose_forces_unified_without_system_prompt()
{   for system_prompt in [None, Some("")]
    {   let messages = messages_array(
          system_prompt,
          "What is 2+2?",
          false,
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is 2+2?");
    }
}

#[test]
fn test_compose_substitutes_question_token()
{   let messages = messages_array(
      Some("Answer: {question}"),
      "What is 2+2?",
      false,
    );
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "Answer: What is 2+2?");
}

#[test]
fn test_compose_unified_concatenates_with_newline()
{   let messages = messages_array(
      Some("You are terse."),
      "Say hello",
      true,
    );
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "You are terse.\nSay hello");
}

#[test]
fn test_compose_split_emits_system_then_user()
{   let messages = messages_array(
      Some("  You are terse.  "),
      "  Say hello  ",
      false,
    );
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, "You are terse.");
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "Say hello");
}

#[test]
fn test_compose_is_idempotent_on_trimmed_inputs()
{   let first = messages_array(
      Some("You are terse."),
      "Say hello",
      false,
    );
    let second = messages_array(
      Some("You are terse."),
      "Say hello",
      false,
    );
    assert_eq!(first, second);
}

// ===== Parameter Mapping =====

fn base_params() -> Map<String, Value>
{   let mut params = Map::new();
    params.insert(
      "model_name".to_string(),
      json!("test-model")
    );
    params
}

#[test]
fn test_model_args_renames_model_name()
{   let args = model_args(&base_params(), &default_naming(), false);
    assert_eq!(args.get("model"), Some(&json!("test-model")));
    assert!(args.get("model_name").is_none());
}

#[test]
fn test_model_args_omits_absent_and_empty_values()
{   let mut params = base_params();
    params.insert("temperature".to_string(), json!(""));
    params.insert("stop".to_string(), json!([]));
    params.insert("max_tokens".to_string(), json!(0));
    let args = model_args(&params, &default_naming(), false);
    assert!(args.get("temperature").is_none());
    // An empty stop list is never sent
    assert!(args.get("stop").is_none());
    // 0-valued numerics count as unset (documented quirk)
    assert!(args.get("max_tokens").is_none());
}

#[test]
fn test_model_args_coerces_types()
{   let mut params = base_params();
    params.insert("temperature".to_string(), json!("0.7"));
    params.insert("top_p".to_string(), json!("2"));
    params.insert("max_tokens".to_string(), json!("100"));
    let args = model_args(&params, &default_naming(), false);
    assert_eq!(args.get("temperature"), Some(&json!(0.7)));
    assert_eq!(args.get("top_p"), Some(&json!(2)));
    assert_eq!(args.get("max_tokens"), Some(&json!(100)));
}

#[test]
fn test_model_args_stream_accepts_string_one_and_bool()
{   for stream in [json!("1"), json!(true)]
    {   let mut params = base_params();
        params.insert("stream".to_string(), stream);
        let args = model_args(&params, &default_naming(), false);
        assert_eq!(args.get("stream"), Some(&json!(true)));
    }
    let mut params = base_params();
    params.insert("stream".to_string(), json!("0"));
    let args = model_args(&params, &default_naming(), false);
    assert_ne!(args.get("stream"), Some(&json!(true)));
}

#[test]
fn test_model_args_surfaces_wire_api_keys_unconditionally()
{   let args = model_args(&base_params(), &default_naming(), true);
    assert_eq!(args.get("provider"), Some(&Value::Null));
    assert_eq!(args.get("api_key"), Some(&Value::Null));
    assert_eq!(args.get("base_url"), Some(&Value::Null));
    assert_eq!(args.get("stop"), Some(&Value::Null));
}

#[test]
fn test_model_args_nests_temperature_for_ollama()
{   let mut params = Map::new();
    params.insert("model".to_string(), json!("ollama"));
    params.insert("temperature".to_string(), json!("0.5"));
    let args = model_args(&params, &default_naming(), false);
    assert!(args.get("temperature").is_none());
    assert_eq!(
      args.get("options"),
      Some(&json!({ "temperature": 0.5 }))
    );
}

#[test]
fn test_merged_params_caller_overrides_win()
{   let config = ProviderConfig::new("openai")
      .with_model("configured-model")
      .with_param("temperature", json!("0.2"));
    let mut additional = Map::new();
    additional.insert(
      "temperature".to_string(),
      json!("0.9")
    );
    let merged = config.merged_params(additional);
    assert_eq!(merged.get("temperature"), Some(&json!("0.9")));
    assert_eq!(
      merged.get("model_name"),
      Some(&json!("configured-model"))
    );
    assert_eq!(merged.get("provider"), Some(&json!("openai")));
}

// ===== Prompt Cleanup =====

#[test]
fn test_clean_refined_prompt_strips_label_and_newlines()
{   assert_eq!(
      clean_refined_prompt("Enhanced Prompt: Hello\nWorld"),
      "Hello World"
    );
}

#[test]
fn test_clean_refined_prompt_strips_all_known_labels()
{   for label in
    [ "Refined Prompt:"
    , "Enhanced Prompt (Output):"
    , "Enhanced Prompt:"
    , "**Enhanced Prompt**:"
    , "**Enhanced Prompt**"
    ]
    {   let raw = format!("{} A cat\r\nin the rain", label);
        assert_eq!(
          clean_refined_prompt(&raw),
          "A cat in the rain"
        );
    }
}

#[test]
fn test_clean_refined_prompt_drops_double_quotes()
{   assert_eq!(
      clean_refined_prompt("\"A quoted prompt\""),
      "A quoted prompt"
    );
}

// ===== Registry =====

#[test]
fn test_registry_resolves_supported_combinations()
{   init_logs();
    for (provider, capability) in
    [ ("openai", GenCapability::Text)
    , ("groq", GenCapability::Text)
    , ("nvidia", GenCapability::Text)
    , ("ollama", GenCapability::Text)
    , ("rhymes", GenCapability::Text)
    , ("openai", GenCapability::Image)
    , ("rhymes", GenCapability::Video)
    ]
    {   let adapter = allgen::registry::resolve(
          provider,
          capability,
          ProviderConfig::new(provider),
        );
        assert!(
          adapter.is_ok(),
          "expected adapter for {}/{:?}",
          provider, capability
        );
    }
}

#[test]
fn test_registry_rejects_unsupported_combinations()
{   for (provider, capability) in
    [ ("groq", GenCapability::Video)
    , ("openai", GenCapability::Video)
    , ("rhymes", GenCapability::Image)
    , ("ollama", GenCapability::Image)
    ]
    {   let adapter = allgen::registry::resolve(
          provider,
          capability,
          ProviderConfig::new(provider),
        );
        assert!(adapter.is_err());
    }
}

#[test]
fn test_registry_rejects_unknown_provider()
{   let adapter = allgen::registry::resolve(
      "acme",
      GenCapability::Text,
      ProviderConfig::new("acme"),
    );
    match adapter
    {   Err(Error::Configuration(message)) => {
          assert!(message.contains("acme"));
        }
      , other => panic!(
          "expected configuration error, got: {:?}",
          other.is_ok()
        )
    }
}

// ===== Poller =====

fn pending_status() -> ResultSet
{   ResultSet::with_job(JobStatus
    {   message: Some("processing".to_string())
      , data: None
    })
}

fn succeeded_status(url: &str) -> ResultSet
{   ResultSet::with_job(JobStatus
    {   message: Some("success".to_string())
      , data: Some(url.to_string())
    })
}

#[test]
fn test_success_tokens()
{   assert!(is_success_token("success"));
    assert!(is_success_token("Success"));
    assert!(is_success_token("成功"));
    assert!(!is_success_token("error"));
}

#[tokio::test]
async fn test_poller_succeeds_without_consuming_budget()
{   init_logs();
    let checks = AtomicUsize::new(0);
    let mut job = AsyncJob::new(
      "job-123",
      PollPolicy::with_wait(0),
    );
    let response = poller::follow_up(&mut job, || async
    {   checks.fetch_add(1, Ordering::SeqCst);
        succeeded_status("https://videos/job-123.mp4")
    }).await;
    assert!(!response.error);
    assert_eq!(
      response.video_url.as_deref(),
      Some("https://videos/job-123.mp4")
    );
    assert_eq!(checks.load(Ordering::SeqCst), 1);
    assert_eq!(job.status, JobState::Succeeded);
    assert_eq!(job.attempts, 1);
}

#[tokio::test]
async fn test_poller_succeeds_after_pending_checks()
{   init_logs();
    let checks = AtomicUsize::new(0);
    let mut job = AsyncJob::new(
      "job-123",
      PollPolicy::with_wait(0),
    );
    let response = poller::follow_up(&mut job, || async
    {   let check = checks.fetch_add(1, Ordering::SeqCst);
        if check < 3
        {   pending_status()
        } else
        {   succeeded_status("https://videos/job-123.mp4")
        }
    }).await;
    assert!(!response.error);
    assert_eq!(
      response.video_url.as_deref(),
      Some("https://videos/job-123.mp4")
    );
    assert_eq!(checks.load(Ordering::SeqCst), 4);
    assert_eq!(job.attempts, 4);
}

#[tokio::test]
async fn test_poller_exhausts_attempt_budget()
{   init_logs();
    let checks = AtomicUsize::new(0);
    let mut job = AsyncJob::new(
      "job-123",
      PollPolicy::with_wait(0),
    );
    let response = poller::follow_up(&mut job, || async
    {   checks.fetch_add(1, Ordering::SeqCst);
        pending_status()
    }).await;
    assert!(response.error);
    assert!(response.error_message.contains("E-500"));
    assert!(response.error_message.contains("job-123"));
    assert_eq!(
      checks.load(Ordering::SeqCst),
      poller::DEFAULT_MAX_ATTEMPTS as usize
    );
    assert_eq!(job.status, JobState::Failed);
}

#[tokio::test]
async fn test_poller_propagates_check_errors_immediately()
{   init_logs();
    let checks = AtomicUsize::new(0);
    let mut job = AsyncJob::new(
      "job-123",
      PollPolicy::with_wait(0),
    );
    let response = poller::follow_up(&mut job, || async
    {   checks.fetch_add(1, Ordering::SeqCst);
        ResultSet::from_error(Error::Status
        {   code: 500
          , detail: String::new()
        })
    }).await;
    assert!(response.error);
    assert!(
      response.error_message
        .contains("Request failed with status code 500")
    );
    assert_eq!(checks.load(Ordering::SeqCst), 1);
    assert_eq!(job.status, JobState::Failed);
}

// ===== Envelope =====

#[test]
fn test_resultset_default_is_success_shape()
{   let resultset = ResultSet::default();
    assert!(!resultset.error);
    assert!(resultset.error_message.is_empty());
    assert_eq!(resultset.response, ResponseBody::Empty);
    assert!(resultset.refined_prompt.is_none());
    assert!(resultset.video_url.is_none());
}

#[test]
fn test_job_status_parses_submit_poll_wire_shape()
{   let job_status: JobStatus = serde_json::from_value(
      json!({ "message": "success", "data": "job-123" })
    ).unwrap();
    assert_eq!(job_status.message.as_deref(), Some("success"));
    assert_eq!(job_status.data.as_deref(), Some("job-123"));

    let job_status: JobStatus = serde_json::from_value(
      json!({ "message": "error", "data": null })
    ).unwrap();
    assert_eq!(job_status.message.as_deref(), Some("error"));
    assert!(job_status.data.is_none());
}
