//! Demo workload served by full deployment runs. Answers every path with a
//! small JSON document so the proxied site has something verifiable behind it.

use std::process::Command;

use axum::extract::{OriginalUri, State};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;

use dockhand::validate::DEMO_MESSAGE;

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "dockhand-demo")]
#[command(about = "Minimal HTTP service used to exercise a deployment")]
struct Cli {
    /// Listen port; falls back to the PORT environment variable
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Clone)]
struct AppState {
    port: u16,
    hostname: String,
    environment: String,
}

fn listen_port(cli: &Cli) -> u16 {
    cli.port
        .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_PORT)
}

fn hostname() -> String {
    Command::new("hostname")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Serialize)]
struct EchoResponse {
    message: &'static str,
    hostname: String,
    timestamp: String,
    environment: String,
    port: u16,
    path: String,
}

async fn echo(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> Json<EchoResponse> {
    Json(EchoResponse {
        message: DEMO_MESSAGE,
        hostname: state.hostname,
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.environment,
        port: state.port,
        path: uri.path().to_string(),
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let port = listen_port(&cli);

    let state = AppState {
        port,
        hostname: hostname(),
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
    };

    let app = Router::new()
        .route("/", get(echo))
        .route("/{*path}", get(echo))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("cannot bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    eprintln!("demo service listening on {}", addr);
    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("server error: {}", err);
        std::process::exit(1);
    }
}
