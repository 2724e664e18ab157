//! Message composition: system prompt + user input into the
//! canonical role-tagged sequence

use log::debug;

use crate::request::Message;

/// Substitution token: a system prompt carrying it is merged with
/// the user input into a single user-role message
pub const QUESTION_TOKEN: &str = "{question}";

/// Build the messages array for an LLM call.
///
/// * A non-empty system prompt without the token and `unified` false
///   yields two messages, system then user, each trimmed.
/// * An absent/empty system prompt, or one carrying the `{question}`
///   token, forces unified mode: a single user-role message.
/// * In unified mode the token is substituted with the user input
///   verbatim; without a token the system prompt and user input are
///   joined with a newline; without a system prompt the user input
///   stands alone. Unified content is trimmed.
///
/// Pure function over strings; no error conditions.
pub fn messages_array(
  system_prompt: Option<&str>
, user_input: &str
, unified: bool
) -> Vec<Message>
{   let system_prompt = system_prompt
      .filter(|prompt| !prompt.is_empty());

    let unified = unified
      || system_prompt
           .map(|prompt| prompt.contains(QUESTION_TOKEN))
           .unwrap_or(true);

    if unified
    {   let unified_prompt = match system_prompt
        {   Some(prompt) if prompt.contains(QUESTION_TOKEN) => {
              prompt.replace(QUESTION_TOKEN, user_input)
            }
          , Some(prompt) => {
              format!("{}\n{}", prompt, user_input)
            }
          , None => {
              user_input.to_string()
            }
        };
        debug!(
          "messages_array | unified content: {} chars",
          unified_prompt.len()
        );
        vec![Message::user(unified_prompt.trim())]
    } else
    {   let system_prompt = system_prompt.unwrap_or_default();
        debug!("messages_array | split system + user messages");
        vec![
          Message::system(system_prompt.trim())
        , Message::user(user_input.trim())
        ]
    }
}
