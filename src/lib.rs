pub mod error;
pub mod config;
pub mod resultset;
pub mod request;
pub mod compose;
pub mod params;
pub mod enhance;
pub mod adapter;
pub mod poller;
pub mod registry;
pub mod providers;
use serde::{Deserialize, Serialize};

/*

allgen (All GENerators): one request syntax for text, image and
video generation across public AI provider APIs. The caller picks a
provider and a capability, gets back an adapter, and every adapter
answers with the same canonical resultset envelope no matter how the
wire format of the provider looks.

allgen/
├── Cargo.toml          # Main manifest
├── src/
│   ├── lib.rs          # Re-exports, provider/capability enums
│   ├── error.rs        # Custom error types and handling
│   ├── config.rs       # Per-request provider configuration
│   ├── resultset.rs    # Canonical result envelope
│   ├── request.rs      # Canonical request and message types
│   ├── compose.rs      # System-prompt/user-input message composition
│   ├── params.rs       # Canonical -> wire parameter mapping
│   ├── enhance.rs      # Prompt enhancement text cleanup
│   ├── adapter.rs      # GenAdapter trait (query/image_gen/video_gen)
│   ├── poller.rs       # Bounded submit-then-poll state machine
│   ├── registry.rs     # (provider, capability) -> adapter resolution
│   └── providers/      # Provider-specific implementations
│       ├── mod.rs      # Re-exports all providers
│       ├── openai.rs   # OpenAI-compatible chat + image generation
│       └── rhymes.rs   # Aria chat + Allegro text-to-video
└── tests/              # Integration tests (wiremock + live, gated)

*/

pub use crate::adapter::GenAdapter;
pub use crate::config::ProviderConfig;
pub use crate::request::CanonicalRequest;
pub use crate::resultset::ResultSet;

/// Enum representing all supported generation providers.
/// Each variant corresponds to a public API or platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum Provider
{
  /// Rhymes AI (Aria chat models, Allegro text-to-video)
  Rhymes
  ,
  /// OpenAI (GPT chat models, DALL-E image generation)
  OpenAi
  ,
  /// Groq (OpenAI-compatible hosted inference)
  Groq
  ,
  /// Nvidia (OpenAI-compatible integrate.api.nvidia.com)
  Nvidia
  ,
  /// Local Ollama runtime (OpenAI-compatible endpoint)
  Ollama
}

impl Provider
{   /// Parse a provider identifier as it arrives from configuration
    pub fn parse(provider_id: &str)
      -> Result<Self, crate::error::Error>
    {   match provider_id
        {   "rhymes" => Ok(Provider::Rhymes)
          , "openai" => Ok(Provider::OpenAi)
          , "groq" => Ok(Provider::Groq)
          , "nvidia" => Ok(Provider::Nvidia)
          , "ollama" => Ok(Provider::Ollama)
          , other => Err(crate::error::Error::Configuration(
              format!("Invalid LLM provider: {}", other)
            ))
        }
    }

    /// The identifier used in configuration and wire parameters
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Provider::Rhymes => "rhymes"
          , Provider::OpenAi => "openai"
          , Provider::Groq => "groq"
          , Provider::Nvidia => "nvidia"
          , Provider::Ollama => "ollama"
        }
    }
}

/// Capability requested from a provider adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum GenCapability
{   /// Chat/completion text generation
    Text
  , /// Text-to-image generation
    Image
  , /// Text-to-video generation (submit-then-poll)
    Video
}

impl GenCapability
{   /// Human-readable capability name for error messages
    pub fn as_str(&self) -> &'static str
    {   match self
        {   GenCapability::Text => "text"
          , GenCapability::Image => "image"
          , GenCapability::Video => "video"
        }
    }
}
