// Library entry - public API

pub mod agent;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod flight_api;
pub mod flight_tools;
pub mod interpreter;
pub mod protocol;
pub mod tools;

// Common re-exports
pub use agent::{Agent, Session, SEARCH_FAILED, STARTUP_PROMPT};
pub use client::{GenerativeModel, ModelClient};
pub use config::Config;
pub use error::{AgentError, ExecutionFailure, Result};
pub use flight_tools::{flight_tool_set, ActionExecutor, FlightActionExecutor, FlightBackend};
pub use interpreter::{classify, ModelReply};
pub use protocol::{AgentStatus, ChatTurn, FunctionInvocation, FunctionResult, Role};
pub use tools::{ToolDeclaration, ToolSet};
