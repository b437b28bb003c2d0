use std::time::Duration;

use clap::{Args, Subcommand};
use rosapi_client::{connect_with_config, AuthMethod, ConnectConfig, Connection, Credentials};

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one command and print the aggregated records.
    Run(RunArgs),
    /// Run a listen-style command and stream records until interrupted.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Router host name or address.
    pub host: String,
    /// API port.
    #[arg(long, default_value_t = rosapi_transport::DEFAULT_PORT)]
    pub port: u16,
    /// Account name.
    #[arg(long, short = 'u', default_value = "admin")]
    pub user: String,
    /// Account password.
    #[arg(long, env = "ROSAPI_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,
    /// Connect and login timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Use the pre-6.43 challenge-response login.
    #[arg(long)]
    pub legacy_auth: bool,
}

impl ConnectArgs {
    pub fn establish(&self) -> CliResult<Connection> {
        let config = ConnectConfig {
            port: self.port,
            timeout: parse_duration(&self.timeout)?,
            auth: if self.legacy_auth {
                AuthMethod::Challenge
            } else {
                AuthMethod::Plain
            },
            ..ConnectConfig::default()
        };
        connect_with_config(
            &self.host,
            &Credentials::new(self.user.clone(), self.password.clone()),
            &config,
        )
        .map_err(|err| client_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Command path, e.g. /interface/print.
    pub command: String,
    /// Additional command words, e.g. =name=ether1 or ?type=ether.
    pub words: Vec<String>,
    /// Maximum time to wait for the command to settle (e.g. 30s).
    #[arg(long, default_value = "30s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Listen-style command path, e.g. /log/listen.
    pub command: String,
    /// Additional command words.
    pub words: Vec<String>,
    /// Exit after receiving N records.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
