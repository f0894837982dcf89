use mailchimp_subscribe::configuration::get_configuration;
use mailchimp_subscribe::startup::Application;
use mailchimp_subscribe::telemetry::get_subscriber;
use mailchimp_subscribe::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("mailchimp-subscribe", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    let app = Application::build(cfg).await?;
    tracing::info!(port = app.get_port(), "listening");
    app.run_until_stopped().await?;

    Ok(())
}
