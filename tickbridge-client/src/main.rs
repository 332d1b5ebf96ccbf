//! tickbridge: command-line controller for a tickbridge bridge

mod cli;

use clap::Parser;
use serde_json::{Map, Value};

use tickbridge_client::{port_file_for, BridgeClient, ClientConfig};
use tickbridge_utils::{init_logging_with_config, read_port_file, BridgeError, LogConfig, Result};

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging_with_config(LogConfig::client()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    let exit_code = match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn execute(cli: Cli) -> Result<i32> {
    let project_dir = cli.project_dir.as_deref();

    if let Command::Port = cli.command {
        let path = port_file_for(project_dir);
        return match read_port_file(&path) {
            Some(port) => {
                println!("{}", port);
                Ok(0)
            }
            None => {
                eprintln!("No bridge port published at {}", path.display());
                Ok(1)
            }
        };
    }

    let mut config = ClientConfig::discover(project_dir).with_host(cli.host);
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }

    let mut client = BridgeClient::connect(&config).await?;

    match cli.command {
        Command::Ping => {
            client.ping().await?;
            println!("pong");
            Ok(0)
        }
        Command::Send { name, params } => {
            let params = parse_params(params.as_deref())?;
            let result = client.send_command(&name, params).await?;
            let rendered = serde_json::to_string_pretty(&result)
                .map_err(|e| BridgeError::internal(e.to_string()))?;
            println!("{}", rendered);
            Ok(0)
        }
        Command::Raw { text } => {
            let envelope = client.request_raw(&text).await?;
            let rendered = envelope
                .to_json()
                .map_err(|e| BridgeError::internal(e.to_string()))?;
            println!("{}", rendered);
            Ok(if envelope.is_success() { 0 } else { 1 })
        }
        Command::Port => Ok(0),
    }
}

fn parse_params(raw: Option<&str>) -> Result<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Null) => Ok(Map::new()),
            Ok(_) => Err(BridgeError::InvalidMessage(
                "--params must be a JSON object".to_string(),
            )),
            Err(e) => Err(BridgeError::InvalidMessage(format!(
                "--params is not valid JSON: {}",
                e
            ))),
        },
    }
}
