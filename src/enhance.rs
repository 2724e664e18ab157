//! Prompt enhancement support: default rewrite instructions and
//! cleanup of the label artifacts models tend to prepend

/// Instructions used for the secondary rewrite call when the caller
/// requests enhancement without supplying their own text
pub const DEFAULT_PROMPT_ENHANCEMENT_TEXT: &str
  = "Act as a prompt engineer. Improve and expand the given text \
     so it becomes a clear, specific and self-contained generation \
     prompt. Answer with the enhanced prompt only, without any \
     explanation, preamble or label.";

/// Literal label artifacts stripped from rewritten prompts.
/// Replacement order matters: newlines are flattened first so the
/// labels match even when the model wraps them.
const REFINEMENT_LABELS: [&str; 5]
  = [ "Refined Prompt:"
    , "Enhanced Prompt (Output):"
    , "Enhanced Prompt:"
    , "**Enhanced Prompt**:"
    , "**Enhanced Prompt**"
    ];

/// Strip known label artifacts, embedded newlines and double quotes
/// from a rewritten prompt, returning the cleaned text.
/// Every double quote is removed, not only wrapping ones.
pub fn clean_refined_prompt(raw: &str) -> String
{   let mut refined_prompt = raw
      .replace('\n', " ")
      .replace('\r', " ");
    for label in REFINEMENT_LABELS
    {   refined_prompt = refined_prompt.replace(label, "");
    }
    refined_prompt
      .trim()
      .replace('"', "")
}
