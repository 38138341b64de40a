//! Command-line interface for talking to a ship.
//!
//! Connection settings come from the environment (see `--help`).

use std::env;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tokio::sync::mpsc;

use urbit_channel::tracing::prelude::*;
use urbit_channel::{
    ChannelClient, ChannelConfig, ChannelEvent, CodecRegistry, ConnectionState, PokeRequest,
    SubscriptionAction, SubscriptionRequest, ship,
};

fn usage() {
    eprintln!("Usage: urbit-cli <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  parse <ship>                 Classify a ship name");
    eprintln!("  watch <app> <wire> [mark]    Subscribe and print events");
    eprintln!("  poke <app> <mark> <json>     Send a poke");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  URBIT_URL            Ship URL (default: http://localhost:8080)");
    eprintln!("  URBIT_ANON_FALLBACK  Fall back to anonymous auth (default: false)");
    eprintln!("  URBIT_TIMEOUT_SECS   Request timeout (default: 60)");
}

#[tokio::main]
async fn main() -> Result<()> {
    urbit_channel::tracing::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        usage();
        std::process::exit(1);
    };

    match (command.as_str(), &args[1..]) {
        ("parse", [name]) => cmd_parse(name),
        ("watch", [app, wire]) => cmd_watch(app, wire, "json").await,
        ("watch", [app, wire, mark]) => cmd_watch(app, wire, mark).await,
        ("poke", [app, mark, json]) => cmd_poke(app, mark, json).await,
        ("-h" | "--help" | "help", _) => {
            usage();
            Ok(())
        }
        _ => {
            usage();
            std::process::exit(1);
        }
    }
}

fn cmd_parse(name: &str) -> Result<()> {
    let ship = ship::parse(name).with_context(|| format!("{:?} is not a ship name", name))?;
    println!("Name:  {}", ship);
    println!("Class: {}", ship.class());
    println!("Short: {}", ship.short());
    Ok(())
}

/// Authenticate, bailing out with the handshake error on failure.
async fn connect(
    registry: CodecRegistry<Value>,
) -> Result<(ChannelClient<Value>, mpsc::Receiver<ChannelEvent<Value>>)> {
    let config = ChannelConfig::from_env()?;
    let (event_tx, event_rx) = mpsc::channel(100);
    let client = ChannelClient::connect(&config, registry, event_tx)?;

    info!(url = %config.url, "Connecting");
    if client.bootstrap().await == ConnectionState::Disconnected {
        let error = client
            .last_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        bail!("authentication failed: {}", error);
    }
    Ok((client, event_rx))
}

async fn cmd_watch(app: &str, wire: &str, mark: &str) -> Result<()> {
    let mut registry = CodecRegistry::new();
    registry.register(".*", |json| Ok(json.clone()))?;

    let (client, mut events) = connect(registry).await?;
    let ship = client.ship().map(|s| s.name().to_string()).unwrap_or_default();

    let request = SubscriptionRequest {
        ship,
        app: app.to_string(),
        mark: mark.to_string(),
        wire: wire.to_string(),
    };
    client
        .subscribe(&request, SubscriptionAction::Subscribe)
        .await
        .context("subscribe failed")?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ChannelEvent::Data { id, path, value }) => {
                    println!("{}", serde_json::json!({"id": id, "path": path, "json": value}));
                }
                Some(ChannelEvent::Error(error)) => warn!(error = %error, "Event error"),
                Some(ChannelEvent::PollingStopped(error)) => bail!("polling stopped: {}", error),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, unsubscribing");
                if let Err(e) = client.unsubscribe(&request).await {
                    warn!(error = %e, "Unsubscribe failed");
                }
                break;
            }
        }
    }

    Ok(())
}

async fn cmd_poke(app: &str, mark: &str, json: &str) -> Result<()> {
    let payload: Value = serde_json::from_str(json).context("poke payload is not JSON")?;

    let (client, _events) = connect(CodecRegistry::new()).await?;
    let request = PokeRequest {
        ship: client.ship().map(|s| s.name().to_string()).unwrap_or_default(),
        app: app.to_string(),
        mark: mark.to_string(),
        wire: "/poke".to_string(),
        payload,
    };

    client.poke(&request).await?;
    println!("Poke acknowledged");
    Ok(())
}
