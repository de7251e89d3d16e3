// Integration tests - full turns against a scripted model

use async_trait::async_trait;
use gemini_flights::flight_tools::{InMemoryFlightBackend, BOOK_FLIGHT, SEARCH_FLIGHTS};
use gemini_flights::protocol::{Content, GenerateContentResponse};
use gemini_flights::{
    classify, flight_tool_set, ActionExecutor, Agent, AgentError, AgentStatus, ChatTurn,
    ExecutionFailure, FlightActionExecutor, FunctionInvocation, FunctionResult, GenerativeModel,
    ModelReply, Role, Session, SEARCH_FAILED, STARTUP_PROMPT,
};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Hands out canned replies in order and records every request
#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<GenerateContentResponse>>,
    requests: Mutex<Vec<Vec<Content>>>,
}

impl ScriptedModel {
    fn new(replies: Vec<GenerateContentResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, contents: &[Content]) -> gemini_flights::Result<GenerateContentResponse> {
        self.requests.lock().unwrap().push(contents.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Api {
                status: 500,
                body: "script exhausted".to_string(),
            })
    }
}

/// Returns a fixed outcome and records what it was asked to run
struct RecordingExecutor {
    outcome: Result<FunctionResult, ExecutionFailure>,
    calls: Mutex<Vec<FunctionInvocation>>,
}

impl RecordingExecutor {
    fn returning(outcome: Result<FunctionResult, ExecutionFailure>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<FunctionInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, invocation: &FunctionInvocation) -> Result<FunctionResult, ExecutionFailure> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.outcome.clone()
    }
}

fn search_args() -> Map<String, Value> {
    json!({"origin": "LAX", "destination": "SFO", "departure_date": "2024-06-01"})
        .as_object()
        .cloned()
        .unwrap()
}

fn flights() -> FunctionResult {
    FunctionResult(json!([{"flight_id": 1, "airline": "United", "price": 129}]))
}

#[tokio::test]
async fn test_startup_introduction() {
    let model = ScriptedModel::new(vec![GenerateContentResponse::from_text(
        "Hi! I'm Rex 🤖✈️, your flights assistant.",
    )]);
    let executor = RecordingExecutor::returning(Ok(flights()));
    let agent = Agent::new(model, executor);
    let mut session = Session::new();

    let introduction = agent.start(&mut session).await.unwrap();

    assert_eq!(
        introduction.as_deref(),
        Some("Hi! I'm Rex 🤖✈️, your flights assistant.")
    );
    let model_turns = session
        .turns()
        .iter()
        .filter(|t| t.role() == Role::Model)
        .count();
    assert_eq!(model_turns, 1);
    assert_eq!(session.turns()[0], ChatTurn::user(STARTUP_PROMPT));
    assert_eq!(session.visible_turns().len(), 1);
    assert!(agent.executor().calls().is_empty());
    assert_eq!(agent.model().requests().len(), 1);
    assert_eq!(
        session.turn_states(),
        &[AgentStatus::ModelGenerating, AgentStatus::AwaitingUserInput]
    );

    // A started session is never introduced twice
    assert_eq!(agent.start(&mut session).await.unwrap(), None);
    assert_eq!(agent.model().requests().len(), 1);
}

#[tokio::test]
async fn test_search_round_trip() {
    let model = ScriptedModel::new(vec![
        GenerateContentResponse::from_function_call(SEARCH_FLIGHTS, search_args()),
        GenerateContentResponse::from_text("I found a United flight for $129 🛫"),
    ]);
    let agent = Agent::new(model, RecordingExecutor::returning(Ok(flights())));
    let mut session = Session::new();

    let output = agent
        .process_message(&mut session, "find flights from LAX to SFO on 2024-06-01")
        .await
        .unwrap();

    assert_eq!(output, "I found a United flight for $129 🛫");

    let calls = agent.executor().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, SEARCH_FLIGHTS);
    assert_eq!(calls[0].arguments, search_args());

    // Initial submission plus the resumed one
    let requests = agent.model().requests();
    assert_eq!(requests.len(), 2);

    let resumed = &requests[1];
    let function_response = resumed
        .last()
        .and_then(|c| c.parts.first())
        .and_then(|p| p.function_response.as_ref())
        .unwrap();
    assert_eq!(function_response.name, SEARCH_FLIGHTS);
    assert_eq!(function_response.response, json!({"content": flights().0}));
    // The model's call is in the history ahead of its response
    assert!(resumed[1].parts[0].function_call.is_some());

    assert_eq!(
        session.turns(),
        &[
            ChatTurn::user("find flights from LAX to SFO on 2024-06-01"),
            ChatTurn::model("I found a United flight for $129 🛫"),
        ]
    );
    assert_eq!(session.status(), AgentStatus::AwaitingUserInput);
    assert_eq!(
        session.turn_states(),
        &[
            AgentStatus::ModelGenerating,
            AgentStatus::ToolPending,
            AgentStatus::ModelResuming,
            AgentStatus::AwaitingUserInput,
        ]
    );
}

#[tokio::test]
async fn test_failed_search_skips_resubmission() {
    let model = ScriptedModel::new(vec![GenerateContentResponse::from_function_call(
        SEARCH_FLIGHTS,
        search_args(),
    )]);
    let agent = Agent::new(
        model,
        RecordingExecutor::returning(Err(ExecutionFailure::NoResult)),
    );
    let mut session = Session::new();

    let output = agent
        .process_message(&mut session, "find flights from LAX to SFO on 2024-06-01")
        .await
        .unwrap();

    assert_eq!(output, SEARCH_FAILED);
    assert_eq!(agent.model().requests().len(), 1);
    assert_eq!(session.turns().last(), Some(&ChatTurn::model("Search Failed")));
    assert_eq!(
        session.turn_states(),
        &[
            AgentStatus::ModelGenerating,
            AgentStatus::ToolPending,
            AgentStatus::AwaitingUserInput,
        ]
    );
}

#[tokio::test]
async fn test_turn_after_failed_search_sends_text_history() {
    let model = ScriptedModel::new(vec![
        GenerateContentResponse::from_function_call(SEARCH_FLIGHTS, search_args()),
        GenerateContentResponse::from_text("Sorry about that 😕"),
    ]);
    let agent = Agent::new(
        model,
        RecordingExecutor::returning(Err(ExecutionFailure::NoResult)),
    );
    let mut session = Session::new();

    agent.process_message(&mut session, "find flights").await.unwrap();
    let output = agent.process_message(&mut session, "ok thanks").await.unwrap();
    assert_eq!(output, "Sorry about that 😕");

    let requests = agent.model().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1],
        vec![
            Content::text(Role::User, "find flights"),
            Content::text(Role::Model, SEARCH_FAILED),
            Content::text(Role::User, "ok thanks"),
        ]
    );
    assert!(requests[1]
        .iter()
        .flat_map(|c| &c.parts)
        .all(|p| p.function_call.is_none()));
}

#[tokio::test]
async fn test_booking_through_flight_executor() {
    let args = json!({"flight_id": 2.0, "seat_type": "economy"});
    let model = ScriptedModel::new(vec![
        GenerateContentResponse::from_function_call(BOOK_FLIGHT, args.as_object().cloned().unwrap()),
        GenerateContentResponse::from_text("Booked! 🎉"),
    ]);
    let executor = FlightActionExecutor::new(
        flight_tool_set().unwrap(),
        InMemoryFlightBackend::with_sample_data(),
    );
    let agent = Agent::new(model, executor);
    let mut session = Session::new();

    let output = agent
        .process_message(&mut session, "book flight 2 in economy")
        .await
        .unwrap();
    assert_eq!(output, "Booked! 🎉");

    let requests = agent.model().requests();
    let response = requests[1]
        .last()
        .and_then(|c| c.parts[0].function_response.clone())
        .unwrap();
    assert_eq!(response.name, BOOK_FLIGHT);
    assert_eq!(response.response["num_seats"], 1);
    assert_eq!(response.response["status"], "confirmed");
}

#[tokio::test]
async fn test_invalid_arguments_render_search_failed() {
    let model = ScriptedModel::new(vec![GenerateContentResponse::from_function_call(
        SEARCH_FLIGHTS,
        json!({"origin": "LAX"}).as_object().cloned().unwrap(),
    )]);
    let executor = FlightActionExecutor::new(
        flight_tool_set().unwrap(),
        InMemoryFlightBackend::with_sample_data(),
    );
    let agent = Agent::new(model, executor);
    let mut session = Session::new();

    let output = agent.process_message(&mut session, "flights from LAX").await.unwrap();
    assert_eq!(output, SEARCH_FAILED);
}

#[tokio::test]
async fn test_resumed_reply_is_not_reclassified() {
    let model = ScriptedModel::new(vec![
        GenerateContentResponse::from_function_call(SEARCH_FLIGHTS, search_args()),
        GenerateContentResponse {
            candidates: vec![gemini_flights::protocol::Candidate {
                content: Some(Content {
                    role: Some(Role::Model),
                    parts: vec![gemini_flights::protocol::Part {
                        text: Some("Want me to book flight 1?".to_string()),
                        function_call: Some(gemini_flights::protocol::FunctionCall {
                            name: BOOK_FLIGHT.to_string(),
                            args: json!({"flight_id": 1}).as_object().cloned().unwrap(),
                        }),
                        function_response: None,
                    }],
                }),
                finish_reason: None,
            }],
        },
    ]);
    let agent = Agent::new(model, RecordingExecutor::returning(Ok(flights())));
    let mut session = Session::new();

    let output = agent
        .process_message(&mut session, "find flights from LAX to SFO on 2024-06-01")
        .await
        .unwrap();

    assert_eq!(output, "Want me to book flight 1?");
    assert_eq!(agent.executor().calls().len(), 1);
}

#[tokio::test]
async fn test_ambiguous_reply_ends_the_turn() {
    let model = ScriptedModel::new(vec![GenerateContentResponse::default()]);
    let agent = Agent::new(model, RecordingExecutor::returning(Ok(flights())));
    let mut session = Session::new();

    let err = agent.process_message(&mut session, "hello").await.unwrap_err();

    assert!(matches!(err, AgentError::InterpreterAmbiguity(_)));
    assert_eq!(session.turns(), &[ChatTurn::user("hello")]);
    assert_eq!(session.status(), AgentStatus::AwaitingUserInput);
}

#[tokio::test]
async fn test_model_error_leaves_conversation_unchanged() {
    let model = ScriptedModel::new(Vec::new());
    let agent = Agent::new(model, RecordingExecutor::returning(Ok(flights())));
    let mut session = Session::new();

    let err = agent.process_message(&mut session, "hello").await.unwrap_err();

    assert!(matches!(err, AgentError::Api { status: 500, .. }));
    assert!(session.conversation().is_empty());
}

#[tokio::test]
async fn test_replayed_session_classifies_the_same() {
    let history = vec![
        ChatTurn::user(STARTUP_PROMPT),
        ChatTurn::model("Hi, I'm Rex 👋"),
    ];
    let next = GenerateContentResponse::from_function_call(SEARCH_FLIGHTS, search_args());

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let model = ScriptedModel::new(vec![next.clone()]);
        let agent = Agent::new(
            model,
            RecordingExecutor::returning(Err(ExecutionFailure::NoResult)),
        );
        let mut session = Session::replay(history.clone());

        agent
            .process_message(&mut session, "find flights from LAX to SFO on 2024-06-01")
            .await
            .unwrap();

        let sent = agent.model().requests();
        // Replayed history goes out ahead of the new message
        assert_eq!(sent[0].len(), 3);
        assert_eq!(sent[0][1], Content::text(Role::Model, "Hi, I'm Rex 👋"));
        outcomes.push(classify(&next).unwrap());
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert!(matches!(outcomes[0], ModelReply::ToolCall(_)));
}

#[tokio::test]
async fn test_history_is_append_only() {
    let model = ScriptedModel::new(vec![
        GenerateContentResponse::from_text("Hi, I'm Rex 👋"),
        GenerateContentResponse::from_text("Where are you flying from? 🌍"),
        GenerateContentResponse::from_function_call(SEARCH_FLIGHTS, search_args()),
        GenerateContentResponse::from_text("Two options found ✈️"),
    ]);
    let agent = Agent::new(model, RecordingExecutor::returning(Ok(flights())));
    let mut session = Session::new();

    agent.start(&mut session).await.unwrap();
    let after_start = session.turns().to_vec();

    agent.process_message(&mut session, "I need a flight").await.unwrap();
    let after_second = session.turns().to_vec();
    assert_eq!(&after_second[..after_start.len()], after_start.as_slice());

    agent
        .process_message(&mut session, "LAX to SFO on 2024-06-01")
        .await
        .unwrap();
    assert_eq!(&session.turns()[..after_second.len()], after_second.as_slice());

    let roles: Vec<Role> = session.turns().iter().map(ChatTurn::role).collect();
    assert_eq!(
        roles,
        [Role::User, Role::Model, Role::User, Role::Model, Role::User, Role::Model]
    );
    assert_eq!(session.turns()[5].content(), "Two options found ✈️");
}
