//! Canonical -> wire parameter mapping.
//!
//! Providers disagree on field names (`model` vs `model_name`) and
//! accepted types (string "1" vs boolean) for the same semantic
//! setting. Mapping is centralized here so adapters stay focused on
//! transport.

use std::collections::HashMap;
use serde_json::{Map, Value, json};
use log::{debug, error};

/// Canonical key -> provider wire key table
pub type NamingTable = HashMap<String, String>;

/// Default naming table: identity except `model_name` -> `model`
pub fn default_naming() -> NamingTable
{   let mut naming = NamingTable::new();
    naming.insert("model_name".to_string(), "model".to_string());
    naming
}

fn wire_key(naming: &NamingTable, key: &str) -> String
{   naming.get(key)
      .cloned()
      .unwrap_or_else(|| key.to_string())
}

/// Whether a canonical value counts as present. Absent, null, false,
/// zero, empty strings and empty collections are all "unset"; a
/// caller that needs a literal zero must use an explicit override
/// (documented quirk, kept on purpose).
pub fn is_set(value: &Value) -> bool
{   match value
    {   Value::Null => false
      , Value::Bool(flag) => *flag
      , Value::Number(number) => {
          number.as_f64().map(|n| n != 0.0).unwrap_or(true)
        }
      , Value::String(text) => !text.is_empty()
      , Value::Array(items) => !items.is_empty()
      , Value::Object(entries) => !entries.is_empty()
    }
}

fn coerce_f64(value: &Value) -> Option<f64>
{   match value
    {   Value::Number(number) => number.as_f64()
      , Value::String(text) => text.trim().parse::<f64>().ok()
      , _ => None
    }
}

fn coerce_i64(value: &Value) -> Option<i64>
{   match value
    {   Value::Number(number) => number.as_i64()
      , Value::String(text) => {
          // Config values may arrive as "1024" or "1024.0"
          text.trim().parse::<i64>().ok()
            .or_else(|| {
              text.trim().parse::<f64>().ok()
                .map(|n| n as i64)
            })
        }
      , _ => None
    }
}

fn coerce_stream(value: &Value) -> bool
{   match value
    {   Value::Bool(flag) => *flag
      , Value::String(text) => text == "1"
      , _ => false
    }
}

/// Translate the canonical parameter set into the wire names and
/// types a provider accepts.
///
/// * `model`/`model_name`, `messages` and `stop` pass through when
///   present, renamed via the naming table (an empty stop list is
///   omitted rather than sent).
/// * `temperature` is coerced to floating point; `top_p` and
///   `max_tokens` to integers.
/// * `stream` becomes boolean: true iff the source value is the
///   literal string "1" or boolean true.
/// * With `for_wire_api`, `provider`/`api_key`/`base_url`/`stop` are
///   surfaced unconditionally for transport-client construction.
/// * A resolved model id of "ollama" moves `temperature` under an
///   `options` sub-map, matching that runtime's convention.
pub fn model_args(
  params: &Map<String, Value>
, naming: &NamingTable
, for_wire_api: bool
) -> Map<String, Value>
{   let mut model_params = Map::new();
    for key in ["model", "model_name", "messages", "stop"]
    {   if let Some(value) = params.get(key).filter(|v| is_set(v))
        {   model_params.insert(
              wire_key(naming, key),
              value.clone()
            );
        }
    }
    for key in ["temperature"]
    {   if let Some(value) = params.get(key).filter(|v| is_set(v))
        {   match coerce_f64(value)
            {   Some(number) => {
                  model_params.insert(
                    wire_key(naming, key),
                    json!(number)
                  );
                }
              , None => {
                  error!(
                    "model_args | non-numeric {}: {:?}",
                    key, value
                  );
                }
            }
        }
    }
    for key in ["top_p", "max_tokens"]
    {   if let Some(value) = params.get(key).filter(|v| is_set(v))
        {   match coerce_i64(value)
            {   Some(number) => {
                  model_params.insert(
                    wire_key(naming, key),
                    json!(number)
                  );
                }
              , None => {
                  error!(
                    "model_args | non-numeric {}: {:?}",
                    key, value
                  );
                }
            }
        }
    }
    for key in ["stream"]
    {   if let Some(value) = params.get(key).filter(|v| is_set(v))
        {   model_params.insert(
              wire_key(naming, key),
              json!(coerce_stream(value))
            );
        }
    }
    if for_wire_api
    {   model_params.insert(
          "provider".to_string(),
          params.get("provider").cloned().unwrap_or(Value::Null)
        );
        model_params.insert(
          "api_key".to_string(),
          params.get("api_key").cloned().unwrap_or(Value::Null)
        );
        model_params.insert(
          "base_url".to_string(),
          params.get("base_url").cloned().unwrap_or(Value::Null)
        );
        model_params.insert(
          "stop".to_string(),
          params.get("stop").cloned().unwrap_or(Value::Null)
        );
    }

    let resolved_model = params.get("model")
      .or_else(|| params.get("model_name"))
      .and_then(|v| v.as_str());
    if resolved_model == Some("ollama")
    {   if let Some(temperature)
          = model_params.remove("temperature")
        {   debug!("model_args | nesting temperature for ollama");
            model_params.insert(
              "options".to_string(),
              json!({ "temperature": temperature })
            );
        }
    }
    model_params
}

/// Extract the transport-client configuration (base URL, API key)
/// from the canonical parameter set
pub fn client_args(
  params: &Map<String, Value>
, naming: &NamingTable
) -> Map<String, Value>
{   let mut client_config = Map::new();
    for key in ["base_url", "api_key"]
    {   if let Some(value) = params.get(key).filter(|v| is_set(v))
        {   client_config.insert(
              wire_key(naming, key),
              value.clone()
            );
        }
    }
    client_config
}
