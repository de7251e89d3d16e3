// Flight tools - declarations, typed requests and the action executor

use crate::error::{ExecutionFailure, Result};
use crate::protocol::{FunctionInvocation, FunctionResult};
use crate::tools::{ParameterSpec, SchemaType, ToolDeclaration, ToolSet};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

pub const SEARCH_FLIGHTS: &str = "get_search_flights";
pub const BOOK_FLIGHT: &str = "post_book_flight";

/// The two flight functions exposed to the model
pub fn flight_tool_set() -> Result<ToolSet> {
    let search = ToolDeclaration::new(
        SEARCH_FLIGHTS,
        "Tool for searching a flight with origin, destination, and departure date",
    )
    .param(ParameterSpec::string(
        "origin",
        "The airport of departure for the flight given in airport code such as LAX, SFO, BOS, etc.",
    ))
    .param(ParameterSpec::string(
        "destination",
        "The airport of destination for the flight given in airport code such as LAX, SFO, BOS, etc.",
    ))
    .param(
        ParameterSpec::string(
            "departure_date",
            "The date of departure for the flight in YYYY-MM-DD format",
        )
        .with_format("date"),
    )
    .require(&["origin", "destination", "departure_date"]);

    let book = ToolDeclaration::new(
        BOOK_FLIGHT,
        "Tool for booking a flight with the flight ID, seat type, and number of seats",
    )
    .param(ParameterSpec::integer("flight_id", "The ID of the flight"))
    .param(ParameterSpec::string(
        "seat_type",
        "The type of seat to be booked. This can be either 'economy', 'business', or 'first_class'",
    ))
    .param(ParameterSpec::integer(
        "num_seats",
        "Optional parameter with a default value of 1. This is the number of seats to be booked",
    ))
    .require(&["flight_id"]);

    ToolSet::new(vec![search, book])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatType {
    Economy,
    Business,
    FirstClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

fn default_num_seats() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub flight_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_type: Option<SeatType>,
    #[serde(default = "default_num_seats")]
    pub num_seats: u32,
}

/// A validated call, ready for the flight service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightAction {
    Search(SearchRequest),
    Book(BookingRequest),
}

impl FlightAction {
    /// Validates the invocation against its declaration, then builds the typed request.
    pub fn from_invocation(
        tools: &ToolSet,
        invocation: &FunctionInvocation,
    ) -> std::result::Result<Self, ExecutionFailure> {
        let declaration = tools
            .get(&invocation.name)
            .ok_or_else(|| ExecutionFailure::UnknownFunction(invocation.name.clone()))?;

        let invalid = |reason: String| ExecutionFailure::InvalidArguments {
            function: invocation.name.clone(),
            reason,
        };

        declaration
            .validate_arguments(&invocation.arguments)
            .map_err(invalid)?;

        let arguments = Value::Object(normalize_integers(declaration, &invocation.arguments));
        let action = match invocation.name.as_str() {
            SEARCH_FLIGHTS => serde_json::from_value(arguments).map(FlightAction::Search),
            BOOK_FLIGHT => serde_json::from_value(arguments).map(FlightAction::Book),
            other => return Err(ExecutionFailure::UnknownFunction(other.to_string())),
        };

        action.map_err(|e| invalid(e.to_string()))
    }
}

/// Integral doubles such as `3.0` become real integers so typed fields accept them.
fn normalize_integers(declaration: &ToolDeclaration, arguments: &Map<String, Value>) -> Map<String, Value> {
    arguments
        .iter()
        .map(|(key, value)| {
            let is_integer = declaration
                .property(key)
                .is_some_and(|p| p.schema_type == SchemaType::Integer);
            // Out-of-range doubles stay as they are and fail typed deserialization
            let value = match value.as_f64() {
                Some(f) if is_integer && !value.is_i64() && !value.is_u64() && fits_i64(f) => {
                    json!(f as i64)
                }
                _ => value.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn fits_i64(f: f64) -> bool {
    // 2^63 is exactly representable; i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (-LIMIT..LIMIT).contains(&f)
}

/// The external flight-data service
#[async_trait]
pub trait FlightBackend: Send + Sync {
    async fn search_flights(&self, request: &SearchRequest) -> std::result::Result<Value, ExecutionFailure>;

    async fn book_flight(&self, request: &BookingRequest) -> std::result::Result<Value, ExecutionFailure>;
}

/// Performs a requested function and returns its result, or a failure
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        invocation: &FunctionInvocation,
    ) -> std::result::Result<FunctionResult, ExecutionFailure>;
}

/// Dispatches flight functions to a backend after checking them against the tool set
pub struct FlightActionExecutor<B> {
    tools: ToolSet,
    backend: B,
}

impl<B: FlightBackend> FlightActionExecutor<B> {
    pub fn new(tools: ToolSet, backend: B) -> Self {
        Self { tools, backend }
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }
}

/// Null, an empty list or an empty object carries nothing the model can use.
fn is_usable(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        _ => true,
    }
}

#[async_trait]
impl<B: FlightBackend> ActionExecutor for FlightActionExecutor<B> {
    async fn execute(
        &self,
        invocation: &FunctionInvocation,
    ) -> std::result::Result<FunctionResult, ExecutionFailure> {
        let action = FlightAction::from_invocation(&self.tools, invocation).inspect_err(|e| {
            warn!(function = %invocation.name, error = %e, "rejected function call");
        })?;
        debug!(?action, "dispatching flight action");

        let value = match &action {
            FlightAction::Search(request) => self.backend.search_flights(request).await?,
            FlightAction::Book(request) => self.backend.book_flight(request).await?,
        };

        if !is_usable(&value) {
            warn!(function = %invocation.name, "flight service returned no usable result");
            return Err(ExecutionFailure::NoResult);
        }

        info!(function = %invocation.name, "flight action succeeded");
        Ok(FunctionResult(value))
    }
}

// ========== In-memory flight service ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flight {
    pub flight_id: i64,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub departure_time: String,
    pub price: u32,
}

/// Fixed flight table standing in for the real service in demos and tests
pub struct InMemoryFlightBackend {
    // (origin, destination) -> flights on that route
    routes: HashMap<(String, String), Vec<Flight>>,
    next_booking_id: AtomicU64,
}

impl InMemoryFlightBackend {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            next_booking_id: AtomicU64::new(1),
        }
    }

    pub fn add_flight(&mut self, flight: Flight) {
        self.routes
            .entry((flight.origin.clone(), flight.destination.clone()))
            .or_default()
            .push(flight);
    }

    pub fn with_sample_data() -> Self {
        let mut backend = Self::new();

        let sample = [
            (1, "United", "LAX", "SFO", 1, "08:15", 129),
            (2, "Delta", "LAX", "SFO", 1, "13:40", 149),
            (3, "Alaska", "SFO", "LAX", 2, "09:05", 119),
            (4, "JetBlue", "BOS", "LAX", 3, "07:30", 289),
            (5, "American", "LAX", "BOS", 5, "22:10", 309),
        ];
        for (id, airline, origin, destination, day, time, price) in sample {
            let Some(departure_date) = NaiveDate::from_ymd_opt(2024, 6, day) else {
                continue;
            };
            backend.add_flight(Flight {
                flight_id: id,
                airline: airline.to_string(),
                origin: origin.to_string(),
                destination: destination.to_string(),
                departure_date,
                departure_time: time.to_string(),
                price,
            });
        }

        backend
    }

    fn find(&self, flight_id: i64) -> Option<&Flight> {
        self.routes.values().flatten().find(|f| f.flight_id == flight_id)
    }
}

impl Default for InMemoryFlightBackend {
    fn default() -> Self {
        Self::with_sample_data()
    }
}

#[async_trait]
impl FlightBackend for InMemoryFlightBackend {
    async fn search_flights(&self, request: &SearchRequest) -> std::result::Result<Value, ExecutionFailure> {
        let key = (
            request.origin.to_uppercase(),
            request.destination.to_uppercase(),
        );
        let flights: Vec<&Flight> = self
            .routes
            .get(&key)
            .map(|route| {
                route
                    .iter()
                    .filter(|f| f.departure_date == request.departure_date)
                    .collect()
            })
            .unwrap_or_default();

        serde_json::to_value(flights).map_err(|e| ExecutionFailure::Unreachable(e.to_string()))
    }

    async fn book_flight(&self, request: &BookingRequest) -> std::result::Result<Value, ExecutionFailure> {
        let Some(flight) = self.find(request.flight_id) else {
            return Ok(Value::Null);
        };

        let total_price = flight.price.checked_mul(request.num_seats).ok_or_else(|| {
            ExecutionFailure::InvalidArguments {
                function: BOOK_FLIGHT.to_string(),
                reason: format!("{} seats is more than can be priced", request.num_seats),
            }
        })?;

        let booking_id = self.next_booking_id.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "booking_id": booking_id,
            "flight_id": flight.flight_id,
            "airline": flight.airline,
            "seat_type": request.seat_type.unwrap_or(SeatType::Economy),
            "num_seats": request.num_seats,
            "total_price": total_price,
            "status": "confirmed"
        }))
    }
}
