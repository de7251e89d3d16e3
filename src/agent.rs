// Conversation orchestrator - one user turn, at most one function round trip

use crate::client::GenerativeModel;
use crate::error::Result;
use crate::flight_tools::ActionExecutor;
use crate::interpreter::{classify, final_text, ModelReply};
use crate::protocol::{AgentStatus, ChatTurn, Content, GenerateContentResponse, Role};
use tracing::{debug, info, warn};

/// First message of every session; its reply is the assistant's self-introduction.
pub const STARTUP_PROMPT: &str = "Introduce yourself as a flights management assistant, Rex, powered by Google Gemini and designed to search/book flights. You use emojis to be interactive. For reference, the year for dates is 2024";

/// Reply shown when the flight service has nothing usable for a function call
pub const SEARCH_FAILED: &str = "Search Failed";

/// In-memory state of one chat session
#[derive(Debug, Clone)]
pub struct Session {
    turns: Vec<ChatTurn>,
    // Everything sent to and received from the model, function parts included
    conversation: Vec<Content>,
    status: AgentStatus,
    // States entered during the latest turn, in order
    turn_states: Vec<AgentStatus>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            conversation: Vec::new(),
            status: AgentStatus::AwaitingUserInput,
            turn_states: Vec::new(),
        }
    }

    /// Rebuilds a session from stored turns without contacting the model or the flight service.
    pub fn replay(turns: impl IntoIterator<Item = ChatTurn>) -> Self {
        let mut session = Self::new();
        for turn in turns {
            session
                .conversation
                .push(Content::text(turn.role(), turn.content()));
            session.turns.push(turn);
        }
        session
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Turns worth rendering: the startup prompt stays hidden.
    pub fn visible_turns(&self) -> &[ChatTurn] {
        match self.turns.first() {
            Some(first) if first.role() == Role::User && first.content() == STARTUP_PROMPT => {
                &self.turns[1..]
            }
            _ => self.turns.as_slice(),
        }
    }

    pub fn conversation(&self) -> &[Content] {
        &self.conversation
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Every state the latest turn passed through, ending with `AwaitingUserInput`.
    pub fn turn_states(&self) -> &[AgentStatus] {
        &self.turn_states
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn set_status(&mut self, status: AgentStatus) {
        debug!(?status, "session state");
        self.status = status;
        self.turn_states.push(status);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives model requests and function execution for a session
pub struct Agent<M, E> {
    model: M,
    executor: E,
}

impl<M: GenerativeModel, E: ActionExecutor> Agent<M, E> {
    pub fn new(model: M, executor: E) -> Self {
        Self { model, executor }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Sends the startup prompt if the session has no turns yet and returns the introduction.
    pub async fn start(&self, session: &mut Session) -> Result<Option<String>> {
        if !session.is_empty() {
            return Ok(None);
        }

        info!("starting new session");
        self.process_message(session, STARTUP_PROMPT).await.map(Some)
    }

    /// Runs one user turn to completion and returns the text to render.
    pub async fn process_message(&self, session: &mut Session, user_input: &str) -> Result<String> {
        session.turns.push(ChatTurn::user(user_input));
        session.turn_states.clear();

        let outcome = self.run_turn(session, user_input).await;
        session.set_status(AgentStatus::AwaitingUserInput);

        let output = outcome?;
        session.turns.push(ChatTurn::model(output.clone()));
        Ok(output)
    }

    async fn run_turn(&self, session: &mut Session, user_input: &str) -> Result<String> {
        session.set_status(AgentStatus::ModelGenerating);
        let mark = session.conversation.len();
        let reply = self
            .submit(session, Content::text(Role::User, user_input))
            .await?;

        let invocation = match classify(&reply)? {
            ModelReply::FinalText(text) => return Ok(text),
            ModelReply::ToolCall(invocation) => invocation,
        };

        session.set_status(AgentStatus::ToolPending);
        info!(function = %invocation.name, "model requested a function call");

        let result = match self.executor.execute(&invocation).await {
            Ok(result) => result,
            Err(failure) => {
                warn!(function = %invocation.name, error = %failure, "function call failed");
                // The unanswered call is replaced so the next request stays well formed
                session.conversation.truncate(mark + 1);
                session
                    .conversation
                    .push(Content::text(Role::Model, SEARCH_FAILED));
                return Ok(SEARCH_FAILED.to_string());
            }
        };

        session.set_status(AgentStatus::ModelResuming);
        let response = Content::function_response(invocation.name, result.into_response_payload());
        let reply = self.submit(session, response).await?;

        final_text(&reply)
    }

    /// Appends `content` to the conversation and asks the model for the next reply.
    /// The conversation is left untouched if the request fails.
    async fn submit(&self, session: &mut Session, content: Content) -> Result<GenerateContentResponse> {
        let mark = session.conversation.len();
        session.conversation.push(content);

        match self.model.generate(&session.conversation).await {
            Ok(reply) => {
                if let Some(content) = reply.first_content() {
                    session.conversation.push(content.clone());
                }
                Ok(reply)
            }
            Err(e) => {
                session.conversation.truncate(mark);
                Err(e)
            }
        }
    }
}
