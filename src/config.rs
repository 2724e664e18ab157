//! Per-request provider configuration

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::params::{NamingTable, default_naming};

/// Configuration handed to an adapter for one request. Owned per
/// request, read-only input, never shared across calls. Values
/// arrive as plain key/value settings from the embedding process;
/// adapters fall back to conventional environment variables for
/// anything left unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Provider identifier ("openai", "rhymes", ...)
    pub provider: String
  , /// API key; None means "use the provider's env variable"
    pub api_key: Option<String>
  , /// Model identifier; None means "use the provider's default"
    pub model_name: Option<String>
  , /// API base URL override
    pub base_url: Option<String>
  , /// Canonical key -> wire key overrides for this provider
    pub naming: NamingTable
  , /// Remaining canonical parameters as plain key/value settings
    /// (temperature, top_p, max_tokens, stream, stop, size, ...)
    pub params: Map<String, Value>
}

impl ProviderConfig
{   /// Configuration for a provider with the default naming table
    pub fn new(provider: impl Into<String>) -> Self
    {   ProviderConfig
        {   provider: provider.into()
          , api_key: None
          , model_name: None
          , base_url: None
          , naming: default_naming()
          , params: Map::new()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>)
      -> Self
    {   self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>)
      -> Self
    {   self.model_name = Some(model_name.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>)
      -> Self
    {   self.base_url = Some(base_url.into());
        self
    }

    pub fn with_param(
      mut self
    , key: impl Into<String>
    , value: Value
    ) -> Self
    {   self.params.insert(key.into(), value);
        self
    }

    /// The canonical parameter set for one call: configured params,
    /// the typed fields, then caller-supplied additions on top
    /// (caller-supplied values win)
    pub fn merged_params(
      &self
    , additional_params: Map<String, Value>
    ) -> Map<String, Value>
    {   let mut params = self.params.clone();
        params.insert(
          "provider".to_string(),
          Value::String(self.provider.clone())
        );
        if let Some(api_key) = &self.api_key
        {   params.insert(
              "api_key".to_string(),
              Value::String(api_key.clone())
            );
        }
        if let Some(model_name) = &self.model_name
        {   params.insert(
              "model_name".to_string(),
              Value::String(model_name.clone())
            );
        }
        if let Some(base_url) = &self.base_url
        {   params.insert(
              "base_url".to_string(),
              Value::String(base_url.clone())
            );
        }
        for (key, value) in additional_params
        {   params.insert(key, value);
        }
        params
    }
}
