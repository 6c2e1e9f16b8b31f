//! Command-line inspection of OGC download services.
//!
//! - `capabilities`: JSON summary of a WFS, WCS or OGC API service
//! - `parameters`: recognized request parameters of a protocol version
//! - `atom-links`: data links reachable from an Atom feed

mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ogc_capabilities::{CapabilitiesDocument, ParameterCatalog, Protocol, ServiceType};
use ogc_client::{AtomClient, ClientConfig, MemoryAccess};
use ogc_common::{HttpClient, ReqwestHttp};

#[derive(Parser, Debug)]
#[command(name = "ogc-fetch")]
#[command(about = "Inspect OGC download services (WFS, WCS, OGC API, Atom)")]
struct Args {
    /// YAML client configuration
    #[arg(long, env = "OGC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of the service capabilities
    Capabilities {
        /// WFS, WCS or OGCAPI
        service: ServiceType,
        /// Protocol version (ignored for OGC API)
        #[arg(long, default_value = "2.0.0")]
        version: String,
        url: String,
    },
    /// Print the recognized request parameters
    Parameters {
        /// WFS or WCS
        protocol: String,
        version: String,
    },
    /// Print the data links of an Atom feed
    AtomLinks { url: String },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the command output
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    Ok(config.with_env()?)
}

fn parse_protocol(name: &str) -> Result<Protocol> {
    match name.to_ascii_uppercase().as_str() {
        "WFS" => Ok(Protocol::Wfs),
        "WCS" => Ok(Protocol::Wcs),
        other => anyhow::bail!("Unknown protocol: {}", other),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let config = load_config(args.config.as_ref())?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttp::new(&config.user_agent)?);

    match args.command {
        Command::Capabilities {
            service,
            version,
            url,
        } => {
            info!(%service, version, url, "Fetching capabilities");
            let doc = CapabilitiesDocument::fetch(
                http.as_ref(),
                service,
                &version,
                &url,
                &config.fetch_options(),
            )
            .with_context(|| format!("Failed to read capabilities of {}", url))?;
            print_json(&summary::capabilities(&doc))?;
        }
        Command::Parameters { protocol, version } => {
            let catalog = ParameterCatalog::for_version(parse_protocol(&protocol)?, &version)?;
            print_json(&summary::parameters(catalog))?;
        }
        Command::AtomLinks { url } => {
            let client = AtomClient::new(&url, http, Arc::new(MemoryAccess::new()), config);
            let mut count = 0usize;
            for link in client.links()? {
                println!("{}", link.href);
                count += 1;
            }
            info!(count, "Atom links resolved");
        }
    }

    Ok(())
}
