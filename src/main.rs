use clap::Parser;
use slidesurvey::cli::{ExportArgs, MarkerArgs};
use slidesurvey::{
    Cli, Command, ExportRequest, MarkerRequest, MarkerSource, OutputFormatter, OutputMode,
    SurveyError, SurveyTool, UserFriendlyError,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli);

    let exit_code = run(&cli);
    process::exit(exit_code);
}

fn run(cli: &Cli) -> i32 {
    if cli.generate_config {
        return handle_generate_config(cli);
    }

    let Some(command) = &cli.command else {
        eprintln!("No command given. Run with --help for usage.");
        return 2;
    };

    let tool = match SurveyTool::from_cli(cli) {
        Ok(tool) => tool,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let outcome = match command {
        Command::Inspect(args) => tool.inspect(&args.input.inputs).map(|batch| batch.errors.len()),
        Command::Export(args) => tool
            .export(&args.input.inputs, &export_request(args))
            .map(|report| {
                tool.output_formatter().print_export_report(&report);
                report.errors.len()
            }),
        Command::Marker(args) => tool.write_marker(&marker_request(args)).map(|_| 0),
    };

    match outcome {
        Ok(0) => 0,
        // Success with parse diagnostics
        Ok(_) => 2,
        Err(e) => {
            tool.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &SurveyError) -> i32 {
    match error {
        SurveyError::Config { .. }
        | SurveyError::InvalidPath { .. }
        | SurveyError::UnknownColumn { .. } => 2,
        SurveyError::NoInputFiles { .. } => 3,
        SurveyError::OutputExists { .. } => 4,
        SurveyError::RowOutOfRange { .. } => 5,
        SurveyError::MissingCoordinates { .. } => 6,
        _ => 1,
    }
}

fn export_request(args: &ExportArgs) -> ExportRequest {
    ExportRequest {
        output: args.output.clone(),
        rows: args.rows.clone().map(|selection| selection.0),
        force: args.force,
    }
}

fn marker_request(args: &MarkerArgs) -> MarkerRequest {
    let source = match &args.from {
        Some(file) => MarkerSource::Observation {
            file: file.clone(),
            seqno: args.seqno.clone(),
        },
        None => MarkerSource::Point {
            lat: args.lat.clone().unwrap_or_default(),
            lon: args.lon.clone().unwrap_or_default(),
        },
    };

    MarkerRequest {
        source,
        name: args.name.clone(),
        description: args.description.clone(),
        output: args.output.clone(),
        kmz: args.kmz,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("slidesurvey.toml"));

    match SurveyTool::generate_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nTo use this configuration:");
            println!(
                "  slidesurvey --config {} export <surveys>",
                config_path.display()
            );
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &SurveyError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("slidesurvey={}", cli.log_directive())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
