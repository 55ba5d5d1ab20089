use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;

use forecast::api::{ProjectionInputs, prepare_projection, run_http_server};
use forecast::core::{
    Config, Snapshot, SweepParameter, SweepRequest, run_projection, run_sensitivity_sweep,
};
use forecast::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "forecast", about = "Month-by-month net worth projections")]
struct Cli {
    /// Default log filter for this crate; RUST_LOG overrides it.
    #[arg(long, global = true, env = "FORECAST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "FORECAST_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "FORECAST_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Project one scenario and print the series as JSON.
    Calculate {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Re-run a scenario across values of one parameter.
    Sweep {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, value_parser = parse_sweep_parameter)]
        parameter: SweepParameter,
        /// Comma-separated values, e.g. 0.1,0.2,0.3
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        values: Vec<f64>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Scenario config as JSON.
    #[arg(long)]
    config: PathBuf,
    /// Accounts and debts as JSON; an empty snapshot when omitted.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// First projected month, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .map_err(|e| format!("invalid listen address {host}:{port}: {e}"))?;
            run_http_server(addr)
                .await
                .map_err(|e| format!("server error: {e}"))
        }
        Command::Calculate { inputs } => {
            let pretty = inputs.pretty;
            let prepared = load_inputs(inputs)?;
            let result = run_projection(&prepared.config, &prepared.snapshot, prepared.start);
            print_json(&result, pretty)
        }
        Command::Sweep {
            inputs,
            parameter,
            values,
        } => {
            let pretty = inputs.pretty;
            let prepared = load_inputs(inputs)?;
            let request = SweepRequest { parameter, values };
            let result = run_sensitivity_sweep(
                &prepared.config,
                &prepared.snapshot,
                prepared.start,
                &request,
            )
            .map_err(|e| e.to_string())?;
            print_json(&result, pretty)
        }
    }
}

fn load_inputs(args: InputArgs) -> Result<ProjectionInputs, String> {
    let config: Config = read_json(&args.config)?;
    let snapshot: Snapshot = match &args.snapshot {
        Some(path) => read_json(path)?,
        None => Snapshot::default(),
    };
    prepare_projection(config, snapshot, args.start_date).map_err(|e| e.to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn parse_sweep_parameter(raw: &str) -> Result<SweepParameter, String> {
    let normalized = raw.trim().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| format!("unknown sweep parameter: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_calculate_with_optional_snapshot() {
        let cli = Cli::try_parse_from([
            "forecast",
            "calculate",
            "--config",
            "config.json",
            "--start-date",
            "2026-03-01",
        ])
        .expect("calculate should parse");
        match cli.command {
            Command::Calculate { inputs } => {
                assert_eq!(inputs.config, PathBuf::from("config.json"));
                assert!(inputs.snapshot.is_none());
                assert_eq!(inputs.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sweep_values_and_kebab_parameter() {
        let cli = Cli::try_parse_from([
            "forecast",
            "sweep",
            "--config",
            "c.json",
            "--parameter",
            "return-shift",
            "--values",
            "-0.01,0,0.01",
        ])
        .expect("sweep should parse");
        match cli.command {
            Command::Sweep {
                parameter, values, ..
            } => {
                assert_eq!(parameter, SweepParameter::ReturnShift);
                assert_eq!(values, vec![-0.01, 0.0, 0.01]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_sweep_parameter() {
        assert!(parse_sweep_parameter("inflation").is_err());
    }

    #[test]
    fn bad_start_date_is_a_parse_error() {
        let parsed = Cli::try_parse_from([
            "forecast",
            "calculate",
            "--config",
            "c.json",
            "--start-date",
            "March",
        ]);
        assert!(parsed.is_err());
    }
}
