mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "rosapi", version, about = "RouterOS management API CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "rosapi",
            "run",
            "192.168.88.1",
            "/interface/print",
            "--user",
            "admin",
            "--password",
            "secret",
        ])
        .expect("run args should parse");

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.connect.host, "192.168.88.1");
                assert_eq!(args.command, "/interface/print");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn trailing_words_pass_through() {
        let cli = Cli::try_parse_from([
            "rosapi",
            "run",
            "router.lan",
            "/ip/address/add",
            "=address=10.0.0.1/24",
            "=interface=ether1",
        ])
        .expect("trailing words should parse");

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.words, vec!["=address=10.0.0.1/24", "=interface=ether1"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_listen_with_count() {
        let cli = Cli::try_parse_from([
            "rosapi",
            "listen",
            "router.lan",
            "/log/listen",
            "--count",
            "10",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.command, "/log/listen");
                assert_eq!(args.count, Some(10));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::try_parse_from(["rosapi", "version", "--extended"])
            .expect("version args should parse");
        assert!(matches!(cli.command, Command::Version(args) if args.extended));
    }
}
