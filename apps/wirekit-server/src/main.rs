use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use wirekit::http::{MiddlewareRef, Request};
use wirekit::{BuildOptions, Host};
use wirekit_bootstrap::{init_logging, AppConfig, CliArgs};

use std::path::{Path, PathBuf};

mod demo;

/// WireKit Server - builds the declared API and inspects or exercises it
#[derive(Parser)]
#[command(name = "wirekit-server")]
#[command(about = "WireKit Server - declarative API assembly")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// REST mount prefix override (overrides config)
    #[arg(long)]
    rest_endpoint: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build everything and report what was compiled
    Check,
    /// List compiled routes with their stage chains
    Routes,
    /// Print the compiled schema as SDL
    Schema,
    /// Dispatch one request through the compiled router
    Call {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, e.g. /rest/notes/1
        path: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
    /// Deliver one websocket event
    Emit {
        namespace: String,
        event: String,
        /// JSON payload
        #[arg(long)]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        rest_endpoint: cli.rest_endpoint.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // defaults -> YAML (if provided) -> env (APP__*) -> CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    init_logging(&logging_config, Path::new(&config.server.home_dir));

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    tracing::info!(rest_endpoint = %config.rest.rest_endpoint, "WireKit Server starting");

    let options =
        BuildOptions::from_config(&config.rest).with_global(MiddlewareRef::named(demo::REQUEST_LOG));
    let mut host = Host::new(options);
    host.discover().context("directive discovery failed")?;
    let artifacts = host.start().context("build failed")?;

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => {
            println!(
                "OK: {} routers, {} routes, {} types, {} websocket namespaces, {} services",
                artifacts.router.routers().len(),
                artifacts.router.routes().len(),
                artifacts.schema.types().len(),
                artifacts.websockets.namespaces().len(),
                artifacts.services.len(),
            );
        }
        Commands::Routes => {
            for route in artifacts.router.routes() {
                println!(
                    "{:<7} {:<32} {}",
                    route.method.as_str(),
                    route.path(),
                    route.stage_names().join(" -> ")
                );
            }
        }
        Commands::Schema => println!("{}", artifacts.schema.to_sdl()),
        Commands::Call { method, path, body } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let mut request = Request::new(method, path);
            if let Some(body) = body {
                request = request.with_body(
                    serde_json::from_str(&body).context("request body is not valid JSON")?,
                );
            }
            let response = artifacts.router.dispatch(request).await;
            println!("{}", response.status);
            if let Some(body) = response.body {
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
        }
        Commands::Emit {
            namespace,
            event,
            payload,
        } => {
            let payload = match payload {
                Some(p) => serde_json::from_str(&p).context("payload is not valid JSON")?,
                None => serde_json::Value::Null,
            };
            let ack = artifacts
                .websockets
                .dispatch(&namespace, &event, payload)
                .await
                .with_context(|| format!("event '{event}' failed"))?;
            match ack {
                Some(ack) => println!("{}", serde_json::to_string_pretty(&ack)?),
                None => println!("(no acknowledgement)"),
            }
        }
    }

    host.stop();
    Ok(())
}
