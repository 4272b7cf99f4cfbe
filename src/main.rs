use newsletter_gateway::configuration::get_configuration;
use newsletter_gateway::startup::Application;
use newsletter_gateway::telemetry::get_subscriber;
use newsletter_gateway::telemetry::init_subscriber;

/// Initialise telemetry, load config, build the newsletter provider, and start
/// the server.
///
/// Invalid configuration (including an unknown `SELECTED_SERVICE_PROVIDER`)
/// is logged and aborts startup with a non-zero exit code.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("newsletter-gateway", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration().inspect_err(|e| {
        tracing::error!(error.message=%e, "Failed to load configuration");
    })?;

    let server = Application::build(cfg).await.inspect_err(|e| {
        tracing::error!(
            error.cause_chain=?e,
            error.message=%e,
            "Failed to start the application"
        );
    })?;

    server.run_until_stopped().await?;
    Ok(())
}
