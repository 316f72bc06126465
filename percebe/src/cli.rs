//! # CLI
//!
//! This module defines the command-line interface of `percebe` using `clap`.
//!
//! Every command needs a schema source: either `--url` for reflection-based
//! discovery or `--root`/`--proto` for static loading. The two are mutually
//! exclusive.
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "percebe", version, about = "Protobuf schema inspection and request templating")]
pub struct Cli {
    /// The server URL to discover schemas from (e.g. http://localhost:50051)
    #[arg(long, global = true, conflicts_with_all = ["root", "proto"])]
    pub url: Option<String>,

    /// Directory the .proto import paths are resolved against
    #[arg(long, global = true, requires = "proto")]
    pub root: Option<PathBuf>,

    /// Entry .proto file, relative to --root
    #[arg(long, global = true, requires = "root")]
    pub proto: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every service and method of the schema source
    List,

    /// Show a method's signature and its request/response schemas
    Describe {
        /// Endpoint (package.Service/Method)
        #[arg(value_parser = parse_endpoint)]
        endpoint: (String, String),
    },

    /// Print an example request body, annotated with trailing comments
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// percebe --url http://localhost:50051 template my.pkg.Service/Method
    /// ```
    Template {
        /// Endpoint (package.Service/Method)
        #[arg(value_parser = parse_endpoint)]
        endpoint: (String, String),
    },

    /// Validate a JSON body against a method's request schema
    ///
    /// Prints every structural finding with its byte offsets and exits with
    /// status 1 if any finding is an error.
    #[command(group(ArgGroup::new("input").required(true).args(["body", "body_file"])))]
    Check {
        /// Endpoint (package.Service/Method)
        #[arg(value_parser = parse_endpoint)]
        endpoint: (String, String),

        /// JSON body to validate
        #[arg(long, value_parser = parse_body)]
        body: Option<serde_json::Value>,

        /// Read the JSON body from a file instead
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
}

fn parse_endpoint(value: &str) -> Result<(String, String), String> {
    let (service, method) = value.split_once('/').ok_or_else(|| {
        format!("Invalid endpoint format: '{value}'. Expected 'package.Service/Method'",)
    })?;

    if service.trim().is_empty() || method.trim().is_empty() {
        return Err("Service and Method names cannot be empty".to_string());
    }

    Ok((service.to_string(), method.to_string()))
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}
