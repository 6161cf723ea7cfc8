mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, SendArgs};
use emailer::email::FileTemplateRenderer;
use emailer::config::TelemetryConfig;
use emailer::{build_transport, telemetry, Config, EmailMessage, MailTransport};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Senders => {
            // Listing profiles needs no usable transport
            telemetry::init(&TelemetryConfig::default());
            let senders = match &cli.config {
                Some(path) => Config::senders_from_file(path)?,
                None => Config::senders_from_env()?,
            };
            senders.validate()?;

            for name in senders.names() {
                println!("{}", name);
            }
        }
        Commands::Send(args) => {
            let config = load_config(cli.config.as_deref())?;
            let transport = transport_from(&config)?;
            let sender = args.sender.clone();
            let message = build_message(args);

            let result = transport.send(&message, &sender).await?;
            match result.message_id {
                Some(id) => println!("sent ({})", id),
                None => println!("sent"),
            }
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            let transport = transport_from(&config)?;
            transport.test_connection().await?;
            println!("{} transport OK", transport.transport_name());
        }
    }

    Ok(())
}

/// Load and validate the full configuration, then start logging
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    telemetry::init(&config.telemetry);
    config.validate()?;
    Ok(config)
}

fn transport_from(config: &Config) -> Result<Arc<dyn MailTransport>> {
    let renderer = Arc::new(FileTemplateRenderer::new(
        &config.templates.content_root,
        &config.templates.emails_folder,
    ));
    info!(templates = %renderer.root().display(), "Using file templates");

    Ok(build_transport(
        &config.transport,
        config.senders.clone(),
        renderer,
    )?)
}

fn build_message(args: SendArgs) -> EmailMessage {
    args.vars.into_iter().fold(
        EmailMessage::new(args.template, args.subject, args.to),
        |message, (key, value)| message.with_variable(key, value),
    )
}
