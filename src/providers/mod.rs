//! Generation provider implementations

pub mod openai;
pub mod rhymes;

// Re-export for convenience
pub use openai::{ChatFamily, OpenaiCompatLlm, OpenaiImageGen};
pub use rhymes::{AllegroLlm, AriaLlm};
