//! Daily note model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;

/// How the day went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Tough,
}

/// A free-text journal entry for one day.
///
/// The pin flag lives in a separate ordered id list on the store, not on the
/// note itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyNote {
    pub id: RecordId,
    pub date: NaiveDate,
    pub content: String,
    pub tags: Vec<String>,
    /// Short accomplishment summary shown on the dashboard
    pub what_i_did: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
}

/// Partial update for a [`DailyNote`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyNotePatch {
    pub date: Option<NaiveDate>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub what_i_did: Option<String>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
}

impl DailyNote {
    /// Merge a partial update into this note, refreshing `updated_at`.
    pub fn apply(&mut self, patch: DailyNotePatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(what_i_did) = patch.what_i_did {
            self.what_i_did = what_i_did;
        }
        if let Some(mood) = patch.mood {
            self.mood = Some(mood);
        }
        if let Some(weather) = patch.weather {
            self.weather = Some(weather);
        }
        self.updated_at = Utc::now();
    }
}
