use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use contest_ics_lib::config::AppConfig;
use contest_ics_lib::ics::{self, CalendarOptions};
use contest_ics_lib::{collect, logging, run, scraping, RunOptions};

#[derive(Parser)]
#[command(name = "contest-ics")]
#[command(about = "Builds an iCalendar file from the AtCoder and OnlineMathContest schedules")]
#[command(version)]
struct Cli {
    /// Output file (default: contest.ics)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only fetch these sources (repeatable). Available: atcoder, omc
    #[arg(short, long = "source")]
    sources: Vec<String>,

    /// Print the registered sources and exit
    #[arg(long)]
    list_sources: bool,

    /// Print the calendar to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    if cli.list_sources {
        for source in scraping::list_sources(&config) {
            println!("{:<8} {:<18} {}", source.id, source.name, source.url);
        }
        return Ok(());
    }

    if cli.stdout {
        let contests = collect(&config, &cli.sources)?;
        print!("{}", ics::render_calendar(&contests, &CalendarOptions::from(&config)));
        return Ok(());
    }

    let report = run(
        &RunOptions {
            output: cli.output,
            sources: cli.sources,
        },
        &config,
    )?;
    println!(
        "✔ {} generated ({} events)",
        report.output.display(),
        report.events
    );
    Ok(())
}
