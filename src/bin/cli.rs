//! cfgstore CLI Client
//!
//! Command-line client for a running cfgstore server.

use clap::{Parser, Subcommand};
use reqwest::Client;

use cfgstore::gateway::{err_code, FetchResponse, UpdateRequest, UpdateResponse};

/// cfgstore CLI
#[derive(Parser, Debug)]
#[command(name = "cfgstore-cli")]
#[command(about = "CLI for the cfgstore configuration store")]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:3400")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a new version of a key
    Set {
        /// The key to write
        key: String,

        /// The configuration payload
        data: String,

        /// Payload format (json or yaml)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Fetch a key (version 0 = latest)
    Get {
        /// The key to fetch
        key: String,

        /// Version to fetch, 0 for latest
        #[arg(short, long, default_value = "0")]
        version: u64,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let client = Client::new();

    let outcome = match args.command {
        Commands::Set { key, data, format } => set(&client, &args.server, key, data, format).await,
        Commands::Get { key, version } => get(&client, &args.server, key, version).await,
    };

    if let Err(e) = outcome {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn set(
    client: &Client,
    server: &str,
    key: String,
    data: String,
    format: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let resp: UpdateResponse = client
        .post(format!("{}/update", server))
        .json(&UpdateRequest {
            key,
            data,
            type_tag: format,
        })
        .send()
        .await?
        .json()
        .await?;

    if resp.err_code == err_code::OK {
        println!("OK");
        Ok(())
    } else {
        Err(format!("errCode {}: {}", resp.err_code, resp.error).into())
    }
}

async fn get(
    client: &Client,
    server: &str,
    key: String,
    version: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let resp: FetchResponse = client
        .get(format!("{}/{}/{}", server, key, version))
        .send()
        .await?
        .json()
        .await?;

    if resp.err_code == err_code::OK {
        let tag = resp.tag.map(|t| t.to_string()).unwrap_or_default();
        println!("[{}] {}", tag, resp.data.unwrap_or_default());
        Ok(())
    } else {
        Err(format!("errCode {}: {}", resp.err_code, resp.error).into())
    }
}
