// Gemini Flights - chat with Rex to search and book flights

use gemini_flights::console::{Presenter, TerminalPresenter};
use gemini_flights::flight_api::HttpFlightBackend;
use gemini_flights::{flight_tool_set, Agent, Config, FlightActionExecutor, ModelClient, Role, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Config::from_env()?;
    let tools = flight_tool_set()?;

    println!("🛫 Gemini Flights ({})\n", config.model);

    let model = ModelClient::new_with_config(
        config.api_key.clone(),
        config.model.clone(),
        config.base_url.clone(),
        tools.clone(),
    )
    .with_temperature(config.temperature)
    .with_timeout(config.request_timeout);

    let backend = HttpFlightBackend::new(config.flight_api_url.clone(), config.request_timeout);
    let agent = Agent::new(model, FlightActionExecutor::new(tools, backend));

    let stdin = std::io::stdin();
    let mut presenter = TerminalPresenter::new(stdin.lock(), std::io::stdout());
    let mut session = Session::new();

    match agent.start(&mut session).await {
        Ok(Some(introduction)) => presenter.render(Role::Model, &introduction),
        Ok(None) => {}
        Err(e) => eprintln!("❌ Error: {}", e),
    }

    // Main loop: one turn at a time until quit or EOF
    while let Some(input) = presenter.read_input() {
        match agent.process_message(&mut session, &input).await {
            Ok(output) => presenter.render(Role::Model, &output),
            Err(e) => eprintln!("\n❌ Error: {}\n", e),
        }
    }

    println!("\n👋 Bye!");
    Ok(())
}
