use std::fmt::Debug;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use tracing::{debug, instrument};

use crate::{
    error::InsightResult,
    insight::{
        breakdown::{activity_statistic, person_statistic},
        datum::{DurationDatum, StatisticalDatum},
        statistic::Statistic,
    },
    preferences::Preferences,
    storage::{entry_source::EntrySource, journal::Journal},
    utils::{
        clock::Clock,
        time::{display_date, logical_date, logical_day_start, next_logical_day_start},
    },
};

use super::{parse_human_date, Args, DateStyle};

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long,
        short,
        help = "First day of the report. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    start: Option<String>,
    #[arg(
        long,
        short,
        help = "Last day of the report, inclusive. Defaults to the first day"
    )]
    end: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        help = "Levels of the activity statistic to expand. Defaults to the preferences"
    )]
    depth: Option<u32>,
}

/// Time per activity and with people over the logical days `from..=to`.
#[instrument(skip(journal, preferences))]
pub fn render_report(
    from: NaiveDate,
    to: NaiveDate,
    depth: u32,
    journal: &Journal,
    preferences: &Preferences,
) -> Result<Vec<String>> {
    let days = (to - from).num_days() + 1;
    let entries = journal.entries().finished_between(
        logical_day_start(from, preferences.start_of_day),
        next_logical_day_start(to, preferences.start_of_day),
    );
    debug!("Reporting {} entries over {days} days", entries.len());

    let mut activities = activity_statistic(&entries, journal.activities())?;
    if preferences.flatten_activity_statistic {
        activities = activities.flattened();
    }
    let people = person_statistic(&entries, journal.people())?;

    let averaged_over = if preferences.show_daily_averages_in_report && days > 1 {
        u32::try_from(days).ok()
    } else {
        None
    };

    let mut lines = vec![if from == to {
        display_date(from)
    } else {
        format!("{} - {}", display_date(from), display_date(to))
    }];
    render_statistic(&activities, depth, averaged_over, 0, &mut lines)?;
    if !people.is_leaf() {
        lines.push(String::new());
        render_statistic(&people, 1, averaged_over, 0, &mut lines)?;
    }
    Ok(lines)
}

/// Expanded nodes show their own time followed by their children, collapsed nodes show the
/// whole subtree.
fn render_statistic<K: Ord + Clone + Debug>(
    statistic: &Statistic<K, DurationDatum>,
    depth: u32,
    averaged_over: Option<u32>,
    indent: usize,
    lines: &mut Vec<String>,
) -> InsightResult<()> {
    let expanded = depth > 0 && !statistic.is_leaf();
    let datum = if expanded {
        statistic.own()
    } else {
        statistic.aggregate()
    };
    let mut line = format!("{}{}\t{datum}", "  ".repeat(indent), statistic.name());
    if let Some(averaged_over) = averaged_over {
        if !datum.is_zero() {
            line += &format!("\t(avg {})", datum.divide_by(averaged_over)?);
        }
    }
    lines.push(line);

    if expanded {
        for child in statistic.sorted_children() {
            render_statistic(child, depth - 1, averaged_over, indent + 1, lines)?;
        }
    }
    Ok(())
}

pub fn process_report_command(
    ReportCommand {
        start,
        end,
        date_style,
        depth,
    }: ReportCommand,
    clock: &impl Clock,
    journal: &Journal,
    preferences: &Preferences,
) -> Result<()> {
    let now = clock.now();
    let today = logical_date(now, preferences.start_of_day);
    let from = match start {
        Some(start) => parse_human_date(&start, now, date_style)?.date(),
        None => today,
    };
    let to = match end {
        Some(end) => parse_human_date(&end, now, date_style)?.date(),
        None => from,
    };
    if to < from {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!(
                    "End {} is before start {}",
                    display_date(to),
                    display_date(from)
                ),
            )
            .into());
    }

    let depth = depth.unwrap_or(preferences.activity_statistic_default_depth);
    for line in render_report(from, to, depth, journal, preferences)? {
        println!("{line}");
    }
    Ok(())
}
