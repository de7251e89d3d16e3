// Protocol definitions - chat turns and hosted-model wire types

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message in the session history. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    role: Role,
    content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A function call extracted from a model reply, alive for one round trip
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInvocation {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Structured data produced by the flight service for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult(pub Value);

impl FunctionResult {
    /// The hosted model only accepts an object as a function response.
    pub fn into_response_payload(self) -> Value {
        match self.0 {
            Value::Object(_) => self.0,
            other => json!({ "content": other }),
        }
    }
}

/// Orchestrator state within one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    AwaitingUserInput,
    ModelGenerating,
    ToolPending,
    ModelResuming,
}

// ========== Hosted-model wire types ==========

/// A role-tagged list of parts, the unit the model consumes and produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            parts: vec![Part::text(text)],
        }
    }

    /// Function results go back to the model as a user-side message.
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part {
                function_response: Some(FunctionResponse {
                    name: name.into(),
                    response,
                }),
                ..Part::default()
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Body of a `generateContent` reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_content(Content::text(Role::Model, text))
    }

    pub fn from_function_call(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self::from_content(Content {
            role: Some(Role::Model),
            parts: vec![Part {
                function_call: Some(FunctionCall {
                    name: name.into(),
                    args,
                }),
                ..Part::default()
            }],
        })
    }

    fn from_content(content: Content) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(content),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    /// The first candidate's content, which is what gets recorded in the conversation
    pub fn first_content(&self) -> Option<&Content> {
        self.candidates.first().and_then(|c| c.content.as_ref())
    }

    /// The first candidate's first part, the only part the interpreter looks at
    pub fn first_part(&self) -> Option<&Part> {
        self.first_content().and_then(|c| c.parts.first())
    }
}
