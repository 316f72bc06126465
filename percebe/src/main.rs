//! # Percebe CLI Entry Point
//!
//! The main executable for the Percebe tool. This file drives the application
//! lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and
//!    sets up logging.
//! 2. **Discovery**: Resolves a [`ServiceCatalog`] from the selected schema
//!    source (server reflection or static `.proto` files) via `percebe_core`.
//! 3. **Execution**: Runs the requested command against the catalog.
//! 4. **Presentation**: Formats and prints the resulting data or error status
//!    to standard output/error.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use formatter::{CatalogSummary, DiagnosticList, FormattedString, MethodSummary};
use percebe_core::catalog::{MethodSchema, SchemaCache, ServiceCatalog};
use percebe_core::reflection::client::ReflectionClient;
use percebe_core::validate::{self, Severity};
use percebe_core::{loader, template};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Where method schemas come from.
enum SchemaSource {
    Reflection(String),
    Static { root: PathBuf, proto: String },
}

impl SchemaSource {
    fn from_args(args: &Cli) -> anyhow::Result<Self> {
        match (&args.url, &args.root, &args.proto) {
            (Some(url), None, None) => Ok(SchemaSource::Reflection(url.clone())),
            (None, Some(root), Some(proto)) => Ok(SchemaSource::Static {
                root: root.clone(),
                proto: proto.clone(),
            }),
            _ => anyhow::bail!("provide a schema source: --url URL, or --root DIR --proto FILE"),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let source = match SchemaSource::from_args(&args) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(2);
        }
    };

    if let Err(err) = run(args.command, source).await {
        eprintln!("{}", FormattedString::from(err));
        process::exit(1);
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` occurrences pick the level.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands, source: SchemaSource) -> anyhow::Result<()> {
    let catalog = resolve_catalog(&source).await?;

    match command {
        Commands::List => {
            println!("{}", FormattedString::from(CatalogSummary(&catalog)));
        }
        Commands::Describe { endpoint } => {
            let method = lookup(&catalog, &endpoint)?;
            println!("{}", FormattedString::from(MethodSummary(method)));
        }
        Commands::Template { endpoint } => {
            let method = lookup(&catalog, &endpoint)?;
            // Raw render output, suitable for piping into an editor buffer.
            print!("{}", template::render(&method.request));
        }
        Commands::Check {
            endpoint,
            body,
            body_file,
        } => {
            let method = lookup(&catalog, &endpoint)?;
            let body = read_body(body, body_file)?;
            let diagnostics = validate::validate(&method.request, &body);
            let failed = diagnostics
                .iter()
                .any(|d| d.severity == Severity::Error);
            println!("{}", FormattedString::from(DiagnosticList(&diagnostics)));
            if failed {
                process::exit(1);
            }
        }
    }

    Ok(())
}

async fn resolve_catalog(source: &SchemaSource) -> anyhow::Result<ServiceCatalog> {
    match source {
        SchemaSource::Reflection(url) => {
            let mut client = ReflectionClient::connect(url).await?;
            let cache = SchemaCache::new();
            Ok(client.discover(&cache).await?)
        }
        SchemaSource::Static { root, proto } => Ok(loader::load_services(root, proto)?),
    }
}

fn lookup<'a>(
    catalog: &'a ServiceCatalog,
    (service, method): &(String, String),
) -> anyhow::Result<&'a MethodSchema> {
    catalog.get(service, method).ok_or_else(|| {
        anyhow::anyhow!("method '{service}/{method}' not found, run `percebe list` to see what the source exposes")
    })
}

fn read_body(
    body: Option<serde_json::Value>,
    body_file: Option<PathBuf>,
) -> anyhow::Result<serde_json::Value> {
    match (body, body_file) {
        (Some(body), None) => Ok(body),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON in '{}'", path.display()))
        }
        // clap's arg group guarantees exactly one is present.
        _ => anyhow::bail!("provide exactly one of --body or --body-file"),
    }
}
