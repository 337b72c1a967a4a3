use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yt_dualsub::api::ApiServer;
use yt_dualsub::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("YouTube Dual-Subtitle Server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Serves time-aligned bilingual YouTube transcripts")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to the standard search paths)")
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDR")
                .help("Address to bind")
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .value_parser(clap::value_parser!(u16))
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .help("Print the effective configuration and exit")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    // Initialize logging
    let default_filter = if matches.get_flag("verbose") {
        "yt_dualsub=debug,tower_http=debug,info".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    if matches.get_flag("print-config") {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    config.validate()?;

    info!("🚀 YouTube Dual-Subtitle Server starting...");
    for line in config.summary().lines() {
        info!("{}", line);
    }

    ApiServer::from_config(Arc::new(config)).start().await
}
