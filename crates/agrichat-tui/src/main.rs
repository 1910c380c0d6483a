//! AgriChat terminal entry point.
//!
//! # Usage
//!
//! ```bash
//! agrichat-tui --user 64f0c1 --role customer \
//!     --server ws://localhost:8000/socket \
//!     --api http://localhost:8000/api/v1/agridirect \
//!     --token "$TOKEN" --log-file agrichat.log
//! ```

use std::{fs::File, sync::Arc};

use agrichat_app::{Runtime, RuntimeConfig, SystemEnv, http::HttpBackend};
use agrichat_client::{ChatClient, ClientConfig};
use agrichat_proto::{Role, UserId};
use agrichat_tui::TerminalDriver;
use clap::Parser;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// AgriChat terminal client
#[derive(Parser, Debug)]
#[command(name = "agrichat-tui")]
#[command(about = "Order chat between farmers and customers")]
#[command(version)]
struct Args {
    /// Messaging server URL (ws:// or wss://)
    #[arg(short, long, env = "AGRICHAT_SERVER", default_value = "ws://localhost:8000/socket")]
    server: String,

    /// Storefront API base URL
    #[arg(
        short,
        long,
        env = "AGRICHAT_API",
        default_value = "http://localhost:8000/api/v1/agridirect"
    )]
    api: String,

    /// Bearer token for the storefront API
    #[arg(short, long, env = "AGRICHAT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Your user id
    #[arg(short, long, env = "AGRICHAT_USER")]
    user: String,

    /// Which side of the order you are on (customer or farmer)
    #[arg(short, long, env = "AGRICHAT_ROLE", default_value = "customer")]
    role: Role,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[arg(long, env = "AGRICHAT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Write logs here instead of stderr
    #[arg(long, env = "AGRICHAT_LOG_FILE")]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // The terminal owns stdout; stderr is only readable when redirected.
    let writer = match &args.log_file {
        Some(path) => BoxMakeWriter::new(Arc::new(File::create(path)?)),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    tracing::info!(user = %args.user, role = %args.role, server = %args.server, "AgriChat starting");

    let config = ClientConfig::new(args.server, UserId::from(args.user), args.role);
    let client = ChatClient::new(SystemEnv::new(), config);
    let backend = HttpBackend::new(args.api, args.token);
    let driver = TerminalDriver::new()?;

    Runtime::new(driver, backend, client, RuntimeConfig::default()).run().await?;

    tracing::info!("AgriChat stopped");
    Ok(())
}
