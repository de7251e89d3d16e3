// Flight booking demo - scripted queries against Gemini with the in-memory flight table
//
// Needs GEMINI_API_KEY; no flight service has to be running.

use gemini_flights::flight_tools::InMemoryFlightBackend;
use gemini_flights::{flight_tool_set, Agent, Config, FlightActionExecutor, ModelClient, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::from_env()?;
    let tools = flight_tool_set()?;

    let model = ModelClient::new_with_config(config.api_key, config.model, config.base_url, tools.clone())
        .with_temperature(config.temperature);
    let executor = FlightActionExecutor::new(tools, InMemoryFlightBackend::with_sample_data());
    let agent = Agent::new(model, executor);
    let mut session = Session::new();

    println!("🛫 Flight booking demo\n");
    println!("═════════════════════════════════════════════\n");

    if let Some(introduction) = agent.start(&mut session).await? {
        println!("🤖 {}\n", introduction);
    }

    let demo_queries = [
        "Find me flights from LAX to SFO on 2024-06-01",
        "Book flight 2 in business class for 2 people",
        "Are there flights from SEA to JFK on 2024-06-01?",
    ];

    for (i, query) in demo_queries.iter().enumerate() {
        println!("👤 Query {}: {}", i + 1, query);
        match agent.process_message(&mut session, query).await {
            Ok(output) => println!("🤖 {}\n", output),
            Err(e) => eprintln!("❌ Error: {}\n", e),
        }
        println!("─────────────────────────────────────────────\n");
    }

    println!("✨ Demo finished ({} turns)", session.turns().len());
    Ok(())
}
