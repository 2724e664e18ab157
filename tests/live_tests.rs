//! Live-network smoke tests. All of them are #[ignore]d: they only
//! run when real provider credentials are available and are invoked
//! explicitly with `cargo test -- --ignored`.

use serde::{Deserialize, Serialize};
use std::fs;

use allgen::{GenCapability, ProviderConfig};

/// Test configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig
{   pub providers: Vec<TestProvider>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestProvider
{   pub name: String
  , pub main_key: String
  , pub models: Vec<TestModel>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestModel
{   pub model_name: String
}

/// Load test configuration from JSON file
fn load_test_config(path: &str)
  -> Result<TestConfig, Box<dyn std::error::Error>>
{   let config_str = fs::read_to_string(path)?;
    let config: TestConfig = serde_json::from_str(&config_str)?;
    Ok(config)
}

/// Get API key from environment or config
fn get_api_key(env_var: &str)
  -> Result<String, Box<dyn std::error::Error>>
{   std::env::var(env_var)
      .map_err(|_| {
        format!("Environment variable {} not set", env_var)
          .into()
      })
}

fn provider_config(name: &str) -> Option<ProviderConfig>
{   // Load test config
    let config = match load_test_config("tests/providers.json")
    {   Ok(config) => config
      , Err(e) => {
          println!("Warning: Failed to load config: {}", e);
          return None;
        }
    };

    let provider = config.providers
      .iter()
      .find(|provider| provider.name == name)?;

    let api_key = match get_api_key(&provider.main_key)
    {   Ok(api_key) => api_key
      , Err(_) => {
          println!(
            "Skipping test: {} not set in environment",
            provider.main_key
          );
          return None;
        }
    };

    let mut config = ProviderConfig::new(name)
      .with_api_key(api_key);
    if let Some(model) = provider.models.first()
    {   config = config.with_model(&model.model_name);
    }
    Some(config)
}

#[tokio::test]
#[ignore]
async fn test_live_openai_query()
{   let config = match provider_config("openai")
    {   Some(config) => config
      , None => return
    };

    let adapter = allgen::registry::resolve(
      "openai",
      GenCapability::Text,
      config,
    ).unwrap();
    let response = adapter
      .query(None, "Say hello", None, false)
      .await;

    match response.text()
    {   Some(text) => {
          println!("Response: {}", text);
          assert!(
            !text.is_empty(),
            "Response should not be empty"
          );
        }
      , None => {
          println!("API Error: {}", response.error_message);
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_live_rhymes_query()
{   let config = match provider_config("rhymes")
    {   Some(config) => config
      , None => return
    };

    let adapter = allgen::registry::resolve(
      "rhymes",
      GenCapability::Text,
      config,
    ).unwrap();
    let response = adapter
      .query(
        Some("Answer briefly: {question}"),
        "What is 2+2?",
        None,
        false,
      )
      .await;

    match response.text()
    {   Some(text) => {
          println!("Response: {}", text);
          assert!(!text.is_empty());
        }
      , None => {
          println!("API Error: {}", response.error_message);
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_live_allegro_video_generation()
{   let config = match provider_config("rhymes_allegro")
    {   Some(config) => config
      , None => return
    };

    let adapter = allgen::registry::resolve(
      "rhymes",
      GenCapability::Video,
      config,
    ).unwrap();
    let submission = adapter
      .video_gen("A sunrise over calm water", None)
      .await;

    if submission.error
    {   println!(
          "Submission failed: {}",
          submission.error_message
        );
        return;
    }

    let completion = adapter
      .video_gen_followup(&submission, 60)
      .await;
    match completion.video_url
    {   Some(video_url) => {
          println!("Video URL: {}", video_url);
        }
      , None => {
          println!(
            "Generation failed: {}",
            completion.error_message
          );
        }
    }
}
