//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emailer")]
#[command(version)]
#[command(about = "Send templated emails over SMTP or SendGrid", long_about = None)]
pub struct Cli {
    /// Settings file (TOML, JSON or YAML). Environment variables are used when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a template and send it
    Send(SendArgs),

    /// Test connectivity and credentials of the configured transport
    Check,

    /// List configured sender profiles
    Senders,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Template identifier
    #[arg(short, long)]
    pub template: String,

    /// Subject line
    #[arg(short, long)]
    pub subject: String,

    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Sender profile name
    #[arg(long, default_value = emailer::DEFAULT_SENDER)]
    pub sender: String,

    /// Extra template variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}
