//! hass-call - send one Home Assistant service call.
//!
//! Writes a single `call_service` frame to a TCP peer (`--connect`) or, by
//! default, to stdout. `--list` prints a domain's action table instead.

use clap::Parser;
use hass_dispatch::envelope::ServiceData;
use hass_dispatch::transport::LineTransport;
use hass_dispatch::{CallContext, Config, Connection, DomainKind};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "hass-call", version, about = "Send one Home Assistant service call")]
struct Args {
    /// Domain, e.g. `media_player`.
    domain: String,

    /// Service within the domain, e.g. `volume_set`.
    service: Option<String>,

    /// Target entity id.
    #[arg(long, short)]
    entity: Option<String>,

    /// JSON object sent as `service_data`.
    #[arg(long, short)]
    data: Option<String>,

    /// Write to this TCP address instead of stdout.
    #[arg(long, env = "HASS_CONNECT")]
    connect: Option<String>,

    /// JSON config file.
    #[arg(long, env = "HASS_CONFIG")]
    config: Option<PathBuf>,

    /// Print the domain's action table and exit.
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    hass_dispatch::observability::init_tracing_with(&config.observability);

    let kind: DomainKind = args.domain.parse()?;

    if args.list {
        if kind.accepts_any_service() {
            println!("{}: any notifier service name (open domain)", kind);
        }
        for spec in kind.actions() {
            println!(
                "{}.{}\ttarget={}\tdata={}",
                kind, spec.service, spec.target, spec.data
            );
        }
        return Ok(());
    }

    let service = args
        .service
        .ok_or("a service name is required unless --list is given")?;
    let data = match &args.data {
        Some(raw) => Some(ServiceData::try_from(serde_json::from_str::<serde_json::Value>(raw)?)?),
        None => None,
    };
    let ctx = CallContext::from_config(&config);

    let conn = match &args.connect {
        Some(addr) => {
            let stream = tokio::net::TcpStream::connect(addr).await?;
            tracing::info!("connected to {}", addr);
            Connection::with_config(LineTransport::new(stream), config.connection.clone())
        }
        None => Connection::with_config(
            LineTransport::new(tokio::io::stdout()),
            config.connection.clone(),
        ),
    };

    conn.call(&ctx, kind, &service, args.entity.as_deref(), data)
        .await
        .map_err(|e| {
            tracing::error!(code = e.code(), "{}.{} failed: {}", kind, service, e);
            e
        })?;

    Ok(())
}
