// Response interpreter - final text or function call?

use crate::error::{AgentError, Result};
use crate::protocol::{FunctionInvocation, GenerateContentResponse, Part};
use serde_json::Map;

/// What a model reply asks the orchestrator to do
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    FinalText(String),
    ToolCall(FunctionInvocation),
}

fn first_part(reply: &GenerateContentResponse) -> Result<&Part> {
    reply
        .first_part()
        .ok_or_else(|| AgentError::InterpreterAmbiguity("reply has no content parts".to_string()))
}

fn part_text(part: &Part) -> Result<String> {
    part.text.clone().ok_or_else(|| {
        AgentError::InterpreterAmbiguity("reply part has neither text nor call arguments".to_string())
    })
}

/// Classifies a reply by its first candidate's first part.
///
/// Only a function call with a non-empty argument map counts as a tool call;
/// an argument-less call descriptor falls through to the part's text. Arguments
/// are copied as-is, without coercion or defaults.
pub fn classify(reply: &GenerateContentResponse) -> Result<ModelReply> {
    let part = first_part(reply)?;

    if let Some(call) = part.function_call.as_ref().filter(|c| !c.args.is_empty()) {
        if call.name.is_empty() {
            return Err(AgentError::InterpreterAmbiguity(
                "function call arguments without a function name".to_string(),
            ));
        }

        let mut arguments = Map::new();
        for (key, value) in &call.args {
            arguments.insert(key.clone(), value.clone());
        }

        return Ok(ModelReply::ToolCall(FunctionInvocation {
            name: call.name.clone(),
            arguments,
        }));
    }

    part_text(part).map(ModelReply::FinalText)
}

/// Text of a reply, with no tool-call detection (used after a function response).
pub fn final_text(reply: &GenerateContentResponse) -> Result<String> {
    first_part(reply).and_then(part_text)
}
