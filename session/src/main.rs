//! Dashkit Session - prints the signed-in user of the configured API.

use dashkit_session::{telemetry, AuthStore, Config, HttpAuthClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = Config::from_env()?;

    tracing::info!(
        app = %config.app_name,
        environment = %config.environment,
        "Checking session against {}",
        config.api_url
    );

    let mut auth = AuthStore::new(HttpAuthClient::new(&config)?);
    auth.fetch_current_user().await;

    let state = auth.state();
    match (&state.user, &state.error) {
        (Some(user), _) => {
            println!("{}", serde_json::to_string_pretty(user)?);
            Ok(())
        }
        (None, error) => Err(error.clone().unwrap_or_else(|| "no user".to_string()).into()),
    }
}
