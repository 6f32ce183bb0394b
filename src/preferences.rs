use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const PREFERENCES_FILE: &str = "preferences.json";

/// User preferences stored in `preferences.json` inside the application directory. Missing
/// fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Time before which entries still belong to the previous day.
    #[serde(with = "time_ser")]
    pub start_of_day: NaiveTime,
    pub flatten_activity_statistic: bool,
    /// How many levels of the activity statistic are expanded in a report.
    pub activity_statistic_default_depth: u32,
    pub show_daily_averages_in_report: bool,
    /// Show points as the difference to plain minutes.
    pub show_points_relative: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            start_of_day: NaiveTime::MIN,
            flatten_activity_statistic: true,
            activity_statistic_default_depth: 1,
            show_daily_averages_in_report: true,
            show_points_relative: false,
        }
    }
}

impl Preferences {
    pub async fn load(application_dir: &Path) -> Result<Self> {
        let path = application_dir.join(PREFERENCES_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Invalid preferences in {path:?}")),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preferences in {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
        }
    }
}

mod time_ser {
    use chrono::NaiveTime;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(D::Error::custom)
    }
}
