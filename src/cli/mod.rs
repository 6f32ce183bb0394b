pub mod day;
pub mod goals;
pub mod report;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use day::{process_day_command, DayCommand};
use goals::{process_goals_command, GoalsCommand};
use report::{process_report_command, ReportCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    preferences::Preferences,
    storage::journal::Journal,
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

/// Directory inside the application directory holding the journal files.
pub const JOURNAL_DIR: &str = "journal";

#[derive(Parser, Debug)]
#[command(name = "timelog", version, long_about = None)]
#[command(about = "Statistics, goal streaks and points over your time log", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default uses $XDG_STATE_HOME/timelog or $HOME/.local/state/timelog"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show streaks and progress of all goals together with today's points")]
    Goals {
        #[command(flatten)]
        command: GoalsCommand,
    },
    #[command(about = "Show time spent per activity and with people over a range of days")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "List entries of a single day")]
    Day {
        #[command(flatten)]
        command: DayCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses dates like "yesterday", "15/03/2025" or "12:00 16/03/2025" relative to `now`. All
/// times are wall clock times without an offset.
pub(crate) fn parse_human_date(
    value: &str,
    now: NaiveDateTime,
    date_style: DateStyle,
) -> Result<NaiveDateTime> {
    parse_date_string(value, Utc.from_utc_datetime(&now), date_style.into())
        .map(|v| v.naive_utc())
        .map_err(|e| {
            Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate date {value:?}: {e}"),
                )
                .into()
        })
}

/// Reads preferences and the journal of `application_dir` concurrently.
pub async fn load_application_data(application_dir: &Path) -> Result<(Preferences, Journal)> {
    let journal_dir = application_dir.join(JOURNAL_DIR);
    tokio::try_join!(
        Preferences::load(application_dir),
        Journal::load(&journal_dir)
    )
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let application_dir = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &application_dir, logging_level, args.log)?;
    debug!("Using application directory {application_dir:?}");

    let (preferences, journal) = load_application_data(&application_dir).await?;
    let clock = DefaultClock;

    match args.commands {
        Commands::Goals { command } => {
            process_goals_command(command, &clock, &journal, &preferences)
        }
        Commands::Report { command } => {
            process_report_command(command, &clock, &journal, &preferences)
        }
        Commands::Day { command } => process_day_command(command, &clock, &journal, &preferences),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tempfile::tempdir;

    use crate::{
        model::activity::ActivityId, preferences::PREFERENCES_FILE,
        storage::journal::ACTIVITIES_FILE,
    };

    use super::{load_application_data, parse_human_date, DateStyle, JOURNAL_DIR};

    const NOW: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2024, 4, 17).unwrap(),
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    );

    #[test]
    fn date_styles() -> Result<()> {
        let expected = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();
        assert_eq!(parse_human_date("03/04/2024", NOW, DateStyle::Uk)?.date(), expected);
        assert_eq!(parse_human_date("04/03/2024", NOW, DateStyle::Us)?.date(), expected);
        assert!(parse_human_date("not a date at all", NOW, DateStyle::Uk).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn loads_preferences_and_journal_of_application_dir() -> Result<()> {
        let dir = tempdir()?;
        let journal_dir = dir.path().join(JOURNAL_DIR);
        tokio::fs::create_dir_all(&journal_dir).await?;
        tokio::fs::write(
            dir.path().join(PREFERENCES_FILE),
            r#"{"start_of_day": "05:00"}"#,
        )
        .await?;
        tokio::fs::write(
            journal_dir.join(ACTIVITIES_FILE),
            r#"{"id": 1, "name": "Reading"}"#,
        )
        .await?;

        let (preferences, journal) = load_application_data(dir.path()).await?;
        assert_eq!(
            preferences.start_of_day,
            NaiveTime::from_hms_opt(5, 0, 0).unwrap()
        );
        assert_eq!(journal.activities().get(ActivityId(1))?.name().as_ref(), "Reading");
        Ok(())
    }
}
