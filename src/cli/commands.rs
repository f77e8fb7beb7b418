//! CLI command implementations.
//!
//! One-shot execution: load the fixture directory into a memory
//! store, run one engine operation, print the payload. Rejections
//! print the error envelope and exit non-zero.

use chrono::Utc;

use crate::engine::{Engine, EngineError};
use crate::response::{error_envelope, Payload};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::fixtures;

pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let store = fixtures::load_dir(&cli.fixtures)?;
    let engine = Engine::new(&store);
    let now = Utc::now().naive_utc();

    let raw = match &cli.command {
        Command::Timeseries { params }
        | Command::Detail { params }
        | Command::DetailAggregate { params }
        | Command::Grid { params } => params,
    };
    let params = parse_params(raw)?;

    let result = match &cli.command {
        Command::Timeseries { .. } => engine.timeseries(&params, now),
        Command::Detail { .. } => engine.detail(&params, now),
        Command::DetailAggregate { .. } => engine.detail_aggregate(&params, now),
        Command::Grid { .. } => engine.grid(&params, now),
    };

    match result {
        Ok(payload) => {
            print_payload(payload);
            Ok(())
        }
        Err(EngineError::Rejected(errors)) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&error_envelope(&errors))
                    .unwrap_or_else(|_| "{}".to_string())
            );
            Err(CliError::Engine(EngineError::Rejected(errors)))
        }
        Err(other) => Err(CliError::Engine(other)),
    }
}

fn parse_params(raw: &[String]) -> CliResult<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| CliError::BadParam(pair.clone()))
        })
        .collect()
}

fn print_payload(payload: Payload) {
    match payload {
        Payload::Json(value) | Payload::GeoJson(value) => println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        ),
        Payload::Csv { filename, body } => {
            eprintln!("attachment; filename={filename}");
            print!("{body}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_splits_on_first_equals() {
        let parsed = parse_params(&[
            "dataset_name=crimes".to_string(),
            "crimes__filter={\"op\":\"eq\"}".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed[0], ("dataset_name".to_string(), "crimes".to_string()));
        assert_eq!(parsed[1].1, "{\"op\":\"eq\"}");
    }

    #[test]
    fn test_parse_params_rejects_bare_token() {
        assert!(matches!(
            parse_params(&["crimes".to_string()]).unwrap_err(),
            CliError::BadParam(_)
        ));
    }
}
