use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vacancy_feed::cli::classify_cmd::{self, ClassifyArgs};
use vacancy_feed::cli::doctor::{self, DoctorArgs};
use vacancy_feed::cli::output;
use vacancy_feed::cli::run_cmd::{self, RunArgs};
use vacancy_feed::FeedError;

#[derive(Parser)]
#[command(name = "vacancy-feed")]
#[command(about = "Publish filtered job vacancies as an accumulating RSS feed")]
#[command(version)]
struct Cli {
    /// Machine-readable output on stdout, JSON logs on stderr
    #[arg(long, global = true)]
    json: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log every classification decision
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Options for the default `run` command
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one cycle: scrape, filter, merge, write (default)
    Run(RunArgs),

    /// Check that a cycle can run in this environment
    Doctor(DoctorArgs),

    /// Show the verdict for grade labels
    Classify(ClassifyArgs),
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vacancy_feed={level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json {
        builder.json().init();
    } else {
        builder.with_ansi(output::color_enabled()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Subcommands read these through cli::output.
    if cli.json {
        std::env::set_var(output::JSON_ENV, "1");
    }
    if cli.quiet {
        std::env::set_var(output::QUIET_ENV, "1");
    }
    if cli.verbose {
        std::env::set_var(output::VERBOSE_ENV, "1");
    }
    if cli.no_color {
        std::env::set_var(output::NO_COLOR_ENV, "1");
    }
    init_tracing(&cli);

    let result = match &cli.command {
        None => run_cmd::run(&cli.run).await,
        Some(Commands::Run(args)) => run_cmd::run(args).await,
        Some(Commands::Doctor(args)) => doctor::run(args).await,
        Some(Commands::Classify(args)) => classify_cmd::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<FeedError>())
                .map(FeedError::kind)
                .unwrap_or("error");
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "error": kind,
                    "message": format!("{e:#}"),
                }));
            } else {
                let s = output::Styled::new();
                eprintln!("  {} {e:#}", s.fail_sym());
            }
            ExitCode::FAILURE
        }
    }
}
