//! Static (provider, capability) -> adapter resolution.
//!
//! A lookup table, not a plugin system: adding a provider means
//! adding an adapter implementation and an entry here. Unsupported
//! combinations fail fast with a configuration error instead of
//! falling through.

use log::debug;

use crate::adapter::GenAdapter;
use crate::config::ProviderConfig;
use crate::error::Error;
use crate::providers::openai::{
  ChatFamily,
  OpenaiCompatLlm,
  OpenaiImageGen,
};
use crate::providers::rhymes::{AllegroLlm, AriaLlm};
use crate::{GenCapability, Provider};

/// Instantiate the adapter registered for a provider identifier and
/// a requested capability
pub fn resolve(
  provider_id: &str
, capability: GenCapability
, config: ProviderConfig
) -> Result<Box<dyn GenAdapter>, Error>
{   let provider = Provider::parse(provider_id)?;
    debug!(
      "resolve | provider: {} | capability: {}",
      provider.as_str(), capability.as_str()
    );
    match (provider, capability)
    {   (Provider::Rhymes, GenCapability::Text) => {
          Ok(Box::new(AriaLlm::new(config)))
        }
      , (Provider::Rhymes, GenCapability::Video) => {
          Ok(Box::new(AllegroLlm::new(config)))
        }
      , (Provider::OpenAi, GenCapability::Image) => {
          Ok(Box::new(OpenaiImageGen::new(config)))
        }
      , (_, GenCapability::Text) => {
          match ChatFamily::from_provider(provider)
          {   Some(family) => {
                Ok(Box::new(OpenaiCompatLlm::new(family, config)))
              }
            , None => Err(unsupported(provider, capability))
          }
        }
      , _ => Err(unsupported(provider, capability))
    }
}

fn unsupported(
  provider: Provider
, capability: GenCapability
) -> Error
{   Error::Configuration(format!(
      "Provider {} does not support {} generation",
      provider.as_str(), capability.as_str()
    ))
}
