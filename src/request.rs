//! Canonical request and message types shared by all adapters

use serde::{Deserialize, Serialize};

/// Message role; at most one system message per sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
}

/// A single role-tagged message in the canonical sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn system(content: impl Into<String>) -> Self
    {   Message
        {   role: Role::System
          , content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Message
        {   role: Role::User
          , content: content.into()
        }
    }
}

/// Provider-agnostic request shape accepted by every adapter.
/// `user_input` must be non-empty by the time it reaches an adapter;
/// `unified` is forced true whenever the system prompt is absent or
/// contains the `{question}` substitution token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest
{   pub system_prompt: Option<String>
  , pub user_input: String
  , pub enhancement_text: Option<String>
  , pub unified: bool
}

impl CanonicalRequest
{   /// Plain request without system prompt or enhancement
    pub fn from_input(user_input: impl Into<String>) -> Self
    {   CanonicalRequest
        {   system_prompt: None
          , user_input: user_input.into()
          , enhancement_text: None
          , unified: false
        }
    }
}
