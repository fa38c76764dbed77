use std::ffi::OsStr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fieldscope_core::Namespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Table => "table",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            other => Err(format!(
                "invalid output format '{other}', expected one of: json, table"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct InputArgs {
    #[arg(long, help = "Aggregation tree snapshot (JSON)")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct RowsArgs {
    #[arg(long, help = "Aggregation tree snapshot (JSON)")]
    pub input: PathBuf,

    #[arg(
        long,
        value_parser = parse_namespace,
        help = "Only print rows for one namespace: visitor, account, custom, or salesforce"
    )]
    pub namespace: Option<Namespace>,

    #[arg(long, help = "Group rows by subscription label, then application")]
    pub by_subscription: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct WindowsArgs {
    #[arg(long, help = "Aggregation tree snapshot (JSON)")]
    pub input: PathBuf,

    #[arg(long, help = "Subscription id holding the application")]
    pub subscription: String,

    #[arg(long, help = "Application id")]
    pub app: String,

    #[arg(
        long,
        default_value = "visitor",
        value_parser = parse_namespace,
        help = "Namespace to compare: visitor, account, custom, or salesforce"
    )]
    pub namespace: Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct CompareArgs {
    #[arg(
        long,
        help = "JSON object of named tables; each table is an object or a JSON-encoded string"
    )]
    pub tables: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Write a default .fieldscope/config.toml if none exists
    Init,
    /// Print per-namespace rows across the 7/30/180-day windows
    Rows(RowsArgs),
    /// Print field drift findings per namespace
    Findings(InputArgs),
    /// Compare field values across named tables
    Compare(CompareArgs),
    /// Compare one application's fields across its processed reporting windows
    Windows(WindowsArgs),
    /// Count applications reporting each field per window
    Coverage(InputArgs),
    /// Summarize subscriptions, scanned records and processed windows
    Overview(InputArgs),
    /// Print the full audit report as JSON
    Report(InputArgs),
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Metadata field audit across reporting windows")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Workspace root holding .fieldscope/config.toml"
    )]
    pub workspace: PathBuf,

    #[arg(
        long,
        global = true,
        help = "JSON object mapping subscription ids to display labels, merged over configured labels"
    )]
    pub labels: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: LogFormat,

    #[arg(
        long,
        global = true,
        default_value = "json",
        value_parser = parse_output_format,
        help = "Output format: json or table"
    )]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

pub fn parse_cli() -> Cli {
    let mut args: Vec<_> = std::env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse()
}

fn parse_namespace(value: &str) -> Result<Namespace, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use fieldscope_core::Namespace;

    use super::{Cli, Commands, LogFormat, OutputFormat};

    #[test]
    fn rows_subcommand_parses_namespace_filter() {
        let cli = Cli::try_parse_from([
            "fieldscope",
            "rows",
            "--input",
            "tree.json",
            "--namespace",
            "account",
            "--output",
            "table",
        ])
        .expect("rows should parse");

        assert_eq!(cli.output, OutputFormat::Table);
        assert_eq!(cli.log_format, LogFormat::Human);
        match cli.command {
            Commands::Rows(args) => {
                assert_eq!(args.input.to_string_lossy(), "tree.json");
                assert_eq!(args.namespace, Some(Namespace::Account));
                assert!(!args.by_subscription);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn windows_subcommand_defaults_to_visitor_namespace() {
        let cli = Cli::try_parse_from([
            "fieldscope",
            "windows",
            "--input",
            "tree.json",
            "--subscription",
            "S1",
            "--app",
            "A1",
        ])
        .expect("windows should parse");

        match cli.command {
            Commands::Windows(args) => {
                assert_eq!(args.subscription, "S1");
                assert_eq!(args.app, "A1");
                assert_eq!(args.namespace, Namespace::Visitor);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let result = Cli::try_parse_from([
            "fieldscope",
            "rows",
            "--input",
            "tree.json",
            "--namespace",
            "events",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fieldscope",
            "compare",
            "--tables",
            "tables.json",
            "--log-format",
            "json",
            "--workspace",
            "/tmp/ws",
        ])
        .expect("compare should parse");

        assert_eq!(cli.log_format.as_str(), "json");
        assert_eq!(cli.output.as_str(), "json");
        assert_eq!(cli.workspace.to_string_lossy(), "/tmp/ws");
        assert!(matches!(cli.command, Commands::Compare(_)));
    }
}
