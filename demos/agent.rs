//! Run a device agent against a relay endpoint.
//!
//! Demonstrates:
//! - Starting the full agent (connection, dispatcher, sensor)
//! - Watching connection state and statistics
//! - Graceful shutdown on Ctrl+C
//!
//! Usage:
//!   cargo run --example agent -- ws://127.0.0.1:9000/mcp/
//!   cargo run --example agent -- "wss://relay.example.com/mcp/?token=..."

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use mcp_device_agent::{AgentConfig, DeviceAgent, Result};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_device_agent=debug".into()),
        )
        .init();

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:9000/mcp/".to_string());

    if let Err(e) = run(&endpoint).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(endpoint: &str) -> Result<()> {
    println!("=== MCP Device Agent ===\n");
    println!("[Setup] Connecting to {endpoint}");

    let agent = DeviceAgent::start(AgentConfig::new(endpoint))?;

    // Report status once a second until interrupted.
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = agent.client().stats();
                let status = agent.state().snapshot()?;
                println!(
                    "[Status] {:?} | sent {} recv {} reconnects {} | {:.1}°C {:.1}%",
                    agent.client().state(),
                    stats.sent,
                    stats.received,
                    stats.reconnects,
                    status.sensors.temperature,
                    status.sensors.humidity,
                );
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n[Shutdown] Stopping agent...");
                break;
            }
        }
    }

    agent.shutdown().await;
    println!("[Shutdown] Done");
    Ok(())
}
