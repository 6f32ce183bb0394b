use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Parser;
use tracing::instrument;

use crate::{
    insight::points::Points,
    preferences::Preferences,
    storage::journal::Journal,
    utils::{clock::Clock, percentage::Percentage, time::logical_date},
};

use super::{parse_human_date, DateStyle};

#[derive(Debug, Parser)]
pub struct GoalsCommand {
    #[arg(
        long,
        help = "Moment to evaluate the goals at. Examples are \"yesterday\", \"12:00 16/03/2025\". Defaults to now"
    )]
    at: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalLine {
    pub label: String,
    pub streak: String,
    pub complete: bool,
    pub progress: String,
    pub percentage: Option<Percentage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalsOverview {
    pub points: Points,
    pub lines: Vec<GoalLine>,
}

/// Streaks of every goal at `reference`, complete goals first, then by label.
#[instrument(skip(journal, preferences))]
pub fn goals_overview(
    reference: NaiveDateTime,
    journal: &Journal,
    preferences: &Preferences,
) -> Result<GoalsOverview> {
    let activities = journal.activities();
    let mut lines = journal
        .goals()
        .iter()
        .map(|goal| -> Result<GoalLine> {
            let streak = goal
                .calculator(preferences.start_of_day, activities, journal.people())?
                .init(reference, journal.entries(), activities)?;
            Ok(GoalLine {
                label: streak.label().to_string(),
                streak: streak.streak().to_string(),
                complete: streak.is_complete(),
                progress: streak.progress().to_string(),
                percentage: streak.progress_percentage(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    lines.sort_by(|a, b| b.complete.cmp(&a.complete).then_with(|| a.label.cmp(&b.label)));

    let points = Points::of_day(
        logical_date(reference, preferences.start_of_day),
        preferences.start_of_day,
        journal.entries(),
        activities,
        journal.people(),
    )?;
    Ok(GoalsOverview { points, lines })
}

/// Progress is only shown for goals that aren't complete yet.
pub fn render_goals(overview: &GoalsOverview, preferences: &Preferences) -> Vec<String> {
    let mut output = vec![format!(
        "{}\tPoints",
        overview.points.render(preferences.show_points_relative)
    )];
    for line in &overview.lines {
        let mut rendered = format!("{}\t{}", line.label, line.streak);
        if !line.complete {
            rendered += &format!("\t{}", line.progress);
            if let Some(percentage) = line.percentage {
                rendered += &format!(" ({percentage})");
            }
        }
        output.push(rendered);
    }
    output
}

pub fn process_goals_command(
    GoalsCommand { at, date_style }: GoalsCommand,
    clock: &impl Clock,
    journal: &Journal,
    preferences: &Preferences,
) -> Result<()> {
    let now = clock.now();
    let reference = match at {
        Some(at) => parse_human_date(&at, now, date_style)?,
        None => now,
    };
    let overview = goals_overview(reference, journal, preferences)?;
    for line in render_goals(&overview, preferences) {
        println!("{line}");
    }
    Ok(())
}
