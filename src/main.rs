use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kubectl_a2a::{A2aContext, FunctionParams, TaskPriority};
use kubectl_a2a::cli::{Cli, Commands, ConfigAction, Display, OutputFormat, parse_params};
use kubectl_a2a::config::{A2aConfig, CONFIG_FILE_NAME, default_config_dir};
use kubectl_a2a::error::{A2aError, Result};

const REDACTED: &str = "********";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("kubectl_a2a=debug")
    } else {
        EnvFilter::new("kubectl_a2a=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let config_dir = cli.config.unwrap_or_else(default_config_dir);
    let format = cli.output;
    debug!(config_dir = %config_dir.display(), "Resolved configuration directory");

    match cli.command {
        Commands::ListFunctions => {
            let context = load_context(&config_dir).await?;
            cmd_list_functions(&display, format, &context)
        }
        Commands::Describe { function_name } => {
            let context = load_context(&config_dir).await?;
            cmd_describe(&display, format, &context, &function_name)
        }
        Commands::Execute {
            function_name,
            params,
            param,
            priority,
        } => {
            let context = load_context(&config_dir).await?;
            let params = parse_params(params.as_deref(), &param)?;
            let result = cmd_execute(
                &display,
                format,
                &context,
                &function_name,
                params,
                priority.map(Into::into),
            )
            .await;
            context.shutdown().await;
            result
        }
        Commands::Config { action } => cmd_config(&display, format, &config_dir, action).await,
    }
}

async fn load_context(config_dir: &Path) -> Result<A2aContext> {
    let config = A2aConfig::load(config_dir).await?;
    A2aContext::new(config)
}

fn cmd_list_functions(display: &Display, format: OutputFormat, context: &A2aContext) -> Result<()> {
    let functions = context.functions.list();
    match format {
        OutputFormat::Text => display.print_function_list(&functions),
        OutputFormat::Json => {
            let listing: Vec<Value> = functions
                .iter()
                .map(|f| {
                    json!({
                        "name": f.name(),
                        "description": f.description(),
                        "schema": f.schema(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }
    Ok(())
}

fn cmd_describe(
    display: &Display,
    format: OutputFormat,
    context: &A2aContext,
    function_name: &str,
) -> Result<()> {
    let function = context
        .functions
        .get(function_name)
        .ok_or_else(|| A2aError::FunctionNotFound(function_name.to_string()))?;

    match format {
        OutputFormat::Text => display.print_function_detail(function.as_ref())?,
        OutputFormat::Json => {
            let detail = json!({
                "name": function.name(),
                "description": function.description(),
                "schema": function.schema(),
            });
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}

async fn cmd_execute(
    display: &Display,
    format: OutputFormat,
    context: &A2aContext,
    function_name: &str,
    params: FunctionParams,
    priority: Option<TaskPriority>,
) -> Result<()> {
    if context.functions.get(function_name).is_none() {
        if format == OutputFormat::Text {
            display.print_info("Use 'list-functions' to see available functions.");
        }
        return Err(A2aError::FunctionNotFound(function_name.to_string()));
    }

    let spinner = (format == OutputFormat::Text)
        .then(|| display.create_spinner(&format!("Executing {function_name}...")));
    let result = context
        .execute_function(function_name, params, priority)
        .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

async fn cmd_config(
    display: &Display,
    format: OutputFormat,
    config_dir: &Path,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut config = A2aConfig::load(config_dir).await?;
            if config.auth.secret.is_some() {
                config.auth.secret = Some(REDACTED.to_string());
            }
            match format {
                OutputFormat::Text => {
                    let yaml = serde_yaml_bw::to_string(&config)?;
                    println!("{}", yaml);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
            }
        }
        ConfigAction::Path => {
            println!("{}", config_dir.join(CONFIG_FILE_NAME).display());
        }
        ConfigAction::Reset => {
            A2aConfig::default().save(config_dir).await?;
            if format == OutputFormat::Text {
                display.print_success("Configuration reset to defaults.");
            }
        }
    }

    Ok(())
}
