use std::fmt;

/// Custom error type for allgen operations
/// Implements Clone so envelopes can carry converted copies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// API key is missing for a provider
    MissingApiKey(String)
  , /// Connection/timeout/DNS failure during a network call
    Transport(String)
  , /// Non-success HTTP status from a provider
    Status
    {   code: u16
      , detail: String
    }
  , /// Well-formed response whose payload signals failure
    Provider(String)
  , /// Successful-looking response with an unexpected payload shape
    Shape(String)
  , /// Polling budget spent without reaching a success marker
    Exhausted
    {   request_id: String
      , last_response: String
    }
  , /// Unsupported provider/capability combination or bad settings
    Configuration(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(provider) => {
              write!(f, "Missing API key for: {}", provider)
            }
          , Error::Transport(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Status { code, detail } => {
              if detail.is_empty()
              {   write!(f,
                    "Request failed with status code {}",
                    code
                  )
              } else
              {   write!(f,
                    "Request failed with status code {}: {}",
                    code, detail
                  )
              }
            }
          , Error::Provider(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Shape(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Exhausted { request_id, last_response } => {
              write!(f,
                "ERROR E-500: Video generation failed \
                 (request_id: {}, response: {})",
                request_id, last_response
              )
            }
          , Error::Configuration(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Provider(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Provider(s.to_string())
    }
}
