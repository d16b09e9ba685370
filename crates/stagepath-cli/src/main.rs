//! `stagepath` command line: render a stage path or click a stage against a
//! fixture data set.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use stagepath_cli::{format_notification, format_view, load_inputs, Inputs, Overrides};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn input_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("config")
            .long("config")
            .value_parser(value_parser!(PathBuf))
            .help("Host configuration (TOML)"),
    )
    .arg(
        Arg::new("data")
            .long("data")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Data set with objects, stage values and records (JSON)"),
    )
    .arg(Arg::new("record").long("record").help("Record ID override"))
    .arg(Arg::new("object").long("object").help("Entity name override"))
    .arg(
        Arg::new("field")
            .long("field")
            .help("Qualified stage field override, Entity.Field"),
    )
    .arg(
        Arg::new("timeout-ms")
            .long("timeout-ms")
            .default_value("2000")
            .value_parser(value_parser!(u64))
            .help("Upper bound for each wait"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Output the view as JSON"),
    )
}

fn cli() -> Command {
    Command::new("stagepath")
        .version(stagepath_core::VERSION)
        .about("Render a record's stage path and move it between stages")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(input_args(
            Command::new("render").about("Load the path and print its steps"),
        ))
        .subcommand(input_args(
            Command::new("click")
                .about("Click a stage and print the outcome")
                .arg(
                    Arg::new("value")
                        .long("value")
                        .required(true)
                        .help("Stage value to move to"),
                ),
        ))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

struct Invocation {
    inputs: Inputs,
    timeout: Duration,
    json: bool,
}

fn invocation(args: &ArgMatches) -> Result<Invocation> {
    let data = args
        .get_one::<PathBuf>("data")
        .context("--data is required")?;
    let overrides = Overrides {
        record_id: args.get_one::<String>("record").cloned(),
        object_api_name: args.get_one::<String>("object").cloned(),
        field: args.get_one::<String>("field").cloned(),
    };
    let inputs = load_inputs(
        args.get_one::<PathBuf>("config").map(PathBuf::as_path),
        data,
        overrides,
    )?;
    let timeout = args.get_one::<u64>("timeout-ms").copied().unwrap_or(2000);
    Ok(Invocation {
        inputs,
        timeout: Duration::from_millis(timeout),
        json: args.get_flag("json"),
    })
}

fn print_view(inv: &Invocation, view: &stagepath_core::PathView) -> Result<()> {
    if inv.json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!(
            "{}",
            format_view(&inv.inputs.config.qualified_field_name, view)
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("render", args)) => {
            let inv = invocation(args)?;
            let view = stagepath_cli::render(&inv.inputs, inv.timeout).await?;
            print_view(&inv, &view)?;
            Ok(if view.error_message.is_some() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Some(("click", args)) => {
            let inv = invocation(args)?;
            let value = args
                .get_one::<String>("value")
                .context("--value is required")?;
            let report = stagepath_cli::click(&inv.inputs, value, inv.timeout).await?;
            for n in &report.notifications {
                eprintln!("{}", format_notification(n));
            }
            print_view(&inv, &report.view)?;
            Ok(if report.failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}
