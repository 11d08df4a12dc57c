pub mod commands;
pub mod config;
pub mod device;
pub mod mqtt;

use crate::commands::input::{prompt_channel, serve_prompts, spawn_stdin_reader};
use crate::commands::{CommandKind, CommandPublisher};
use crate::config::Config;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use mqtt::config::MqttConfig;
use mqtt::mqtt_handler::{HandlerError, MQTTStatus, MqttHandler};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = Config::default_path();
    Config::ensure_default_config(&config_path).await?;
    let config = Config::load(&config_path).await?;

    let mqtt_config = MqttConfig::from_config(&config);
    let topics = mqtt_config.topics.clone();
    info!(
        "Watching device {}/{} on {}:{}",
        config.device.tenant, config.device.device_id, mqtt_config.host, mqtt_config.port
    );

    let cancel = CancellationToken::new();
    let handler = MqttHandler::new(mqtt_config);
    let client = handler.client();

    // One console: both publishers queue for the next typed line
    let (prompts, prompt_requests) = prompt_channel(8);
    let input_handle = tokio::spawn(serve_prompts(
        prompt_requests,
        spawn_stdin_reader(),
        tokio::io::stdout(),
        cancel.child_token(),
    ));

    let publisher_handles: Vec<_> = [CommandKind::SetMax, CommandKind::SetDescanso]
        .into_iter()
        .map(|kind| {
            let publisher =
                CommandPublisher::new(kind, client.clone(), topics.cmd.clone(), prompts.clone());
            tokio::spawn(publisher.run(cancel.child_token()))
        })
        .collect();
    drop(prompts);

    let mut mqtt_handle = tokio::spawn(handler.run(cancel.child_token()));

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| eyre!("Failed to listen for Ctrl-C: {}", e))?;
            println!("\nConnection closed by user.");
            cancel.cancel();
            mqtt_handle.await
        }
        result = &mut mqtt_handle => {
            cancel.cancel();
            result
        }
    };

    for handle in publisher_handles {
        if let Err(e) = handle.await {
            warn!("Publisher task ended abnormally: {}", e);
        }
    }
    if let Err(e) = input_handle.await {
        warn!("Input task ended abnormally: {}", e);
    }

    let status = mqtt_outcome(outcome)?;
    debug!("Final MQTT status: {:?}", status);
    Ok(())
}

/// Keeps the source chain of handler errors so the report shows the underlying cause.
fn mqtt_outcome(
    outcome: std::result::Result<std::result::Result<MQTTStatus, HandlerError>, JoinError>,
) -> Result<MQTTStatus> {
    outcome
        .wrap_err("MQTT task ended abnormally")?
        .wrap_err("MQTT connection failed")
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

/// Diagnostics go to stderr, stdout is the operator console.
fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}
