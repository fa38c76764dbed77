use anyhow::{Context, Result};
use fieldscope::cli::{Cli, Commands, parse_cli};
use fieldscope::commands::{
    CommandContext, load_labels, run_compare_command, run_coverage_command, run_findings_command,
    run_overview_command, run_report_command, run_rows_command, run_windows_command,
};
use fieldscope::logging::init_tracing;
use fieldscope_config::{
    config_path, ensure_workspace_config, load_workspace_config, validate_config,
};

fn main() -> Result<()> {
    let cli = parse_cli();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!(
            "failed to resolve workspace path {}",
            cli.workspace.display()
        )
    })?;

    let config = if matches!(cli.command, Commands::Init) {
        ensure_workspace_config(&workspace)
    } else {
        load_workspace_config(&workspace)
    }
    .with_context(|| {
        format!(
            "failed to load workspace config at {}",
            config_path(&workspace).display()
        )
    })?;

    init_tracing(cli.log_format, &config.logging.level)?;
    for warning in validate_config(&config) {
        tracing::warn!(code = warning.code, "{}", warning.message);
    }

    let mut labels = config.subscriptions.labels;
    if let Some(path) = cli.labels.as_deref() {
        labels.extend(load_labels(path)?);
    }

    let ctx = CommandContext {
        labels,
        display_options: config.report.display_options,
        output: cli.output,
    };
    let mut out = std::io::stdout();

    match &cli.command {
        Commands::Init => {
            tracing::info!(path = %config_path(&workspace).display(), "workspace config ready");
            Ok(())
        }
        Commands::Rows(args) => run_rows_command(&ctx, args, &mut out),
        Commands::Findings(args) => run_findings_command(&ctx, args, &mut out),
        Commands::Compare(args) => run_compare_command(&ctx, args, &mut out),
        Commands::Windows(args) => run_windows_command(&ctx, args, &mut out),
        Commands::Coverage(args) => run_coverage_command(&ctx, args, &mut out),
        Commands::Overview(args) => run_overview_command(&ctx, args, &mut out),
        Commands::Report(args) => run_report_command(&ctx, args, &mut out),
    }
}
