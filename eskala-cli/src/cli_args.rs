use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub output: PathBuf,
    pub config_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub mock_only: bool,
}

#[derive(Debug)]
pub enum CliAction {
    Run(RunOptions),
    Help,
}

pub fn parse_cli_action() -> Result<CliAction> {
    parse_args(env::args().skip(1))
}

pub fn print_help() {
    println!("eskala - due-date escalation report for a JIRA project");
    println!("Usage:");
    println!("  eskala-cli --output <file> [--config <path>] [--cache-dir <path>] [--mock]");
    println!("Options:");
    println!("  --output, -o <file>  Write the report workbook here (.xlsx appended if missing)");
    println!("  --config <path>      Read the config from this file instead of the default");
    println!("  --cache-dir <path>   Keep the issue snapshot here, overriding the config");
    println!("  --mock               Skip the tracker and run built-in sample issues");
}

fn parse_args<I>(args: I) -> Result<CliAction>
where
    I: IntoIterator<Item = String>,
{
    let mut output = None;
    let mut config_path = None;
    let mut cache_dir = None;
    let mut mock_only = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output" | "-o" => {
                output = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("--output requires a value"))?,
                );
            }
            "--config" => {
                config_path = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("--config requires a value"))?,
                );
            }
            "--cache-dir" => {
                cache_dir = Some(
                    args.next()
                        .ok_or_else(|| anyhow!("--cache-dir requires a value"))?,
                );
            }
            "--mock" => {
                mock_only = true;
            }
            "--help" | "-h" => {
                return Ok(CliAction::Help);
            }
            other => return Err(anyhow!("Unknown argument: {other}")),
        }
    }

    let output = output.ok_or_else(|| anyhow!("--output <file> is required"))?;

    Ok(CliAction::Run(RunOptions {
        output: PathBuf::from(output),
        config_path: config_path.map(PathBuf::from),
        cache_dir: cache_dir.map(PathBuf::from),
        mock_only,
    }))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{parse_args, CliAction};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_a_full_run_invocation() {
        let action = parse_args(args(&[
            "--output",
            "bericht",
            "--config",
            "/etc/eskala.yaml",
            "--cache-dir",
            "/tmp/cache",
        ]))
        .expect("action");
        let CliAction::Run(options) = action else {
            panic!("expected run action");
        };

        assert_eq!(options.output, PathBuf::from("bericht"));
        assert_eq!(options.config_path, Some(PathBuf::from("/etc/eskala.yaml")));
        assert_eq!(options.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert!(!options.mock_only);
    }

    #[test]
    fn accepts_the_short_output_flag_and_mock() {
        let action = parse_args(args(&["-o", "report.xlsx", "--mock"])).expect("action");
        let CliAction::Run(options) = action else {
            panic!("expected run action");
        };

        assert_eq!(options.output.to_string_lossy(), "report.xlsx");
        assert!(options.mock_only);
    }

    #[test]
    fn returns_help_action() {
        let action = parse_args(args(&["--help"])).expect("action");
        assert!(matches!(action, CliAction::Help));
    }

    #[test]
    fn requires_an_output_path() {
        let error = parse_args(args(&["--mock"])).expect_err("expected error");
        assert!(error.to_string().contains("--output <file> is required"));
    }

    #[test]
    fn rejects_flags_without_values() {
        let error = parse_args(args(&["--output"])).expect_err("expected error");
        assert!(error.to_string().contains("--output requires a value"));

        let error = parse_args(args(&["-o", "x.xlsx", "--cache-dir"])).expect_err("expected error");
        assert!(error.to_string().contains("--cache-dir requires a value"));
    }

    #[test]
    fn rejects_unknown_arguments() {
        let error = parse_args(args(&["--outptu", "x.xlsx"])).expect_err("expected error");
        assert!(error.to_string().contains("Unknown argument: --outptu"));
    }
}
