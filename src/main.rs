use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use nocturne::config::{RingingConfig, load_ringing_config};
use nocturne::logging;
use nocturne::scenario::{load_scenario, replay};
use nocturne::title::Section;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliSection {
    Everything,
    Alarm,
    Timer,
    Stopwatch,
    WorldClock,
    PrivacyPolicy,
    TermsConditions,
    CookiesPolicy,
}

impl From<CliSection> for Section {
    fn from(value: CliSection) -> Self {
        match value {
            CliSection::Everything => Section::Everything,
            CliSection::Alarm => Section::Alarm,
            CliSection::Timer => Section::Timer,
            CliSection::Stopwatch => Section::Stopwatch,
            CliSection::WorldClock => Section::WorldClock,
            CliSection::PrivacyPolicy => Section::PrivacyPolicy,
            CliSection::TermsConditions => Section::TermsConditions,
            CliSection::CookiesPolicy => Section::CookiesPolicy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "nocturne",
    version,
    about = "Replay alarm and timer ringing scenarios through the notification coordinator"
)]
struct Cli {
    #[arg(long)]
    scenario: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = CliSection::Everything)]
    section: CliSection,

    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    let config = match &cli.config {
        Some(path) => load_ringing_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RingingConfig::default(),
    };
    let scenario = load_scenario(&cli.scenario)
        .with_context(|| format!("failed to load {}", cli.scenario.display()))?;

    let outcome = replay(&scenario, &config, cli.section.into());
    for line in &outcome.lines {
        println!("{line}");
    }
    println!("Scheduled ticks: {}", outcome.ticks);
    println!("Ringing at end: {}", outcome.ringing_at_end);
    Ok(())
}
