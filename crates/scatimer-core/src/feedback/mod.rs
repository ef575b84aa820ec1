//! Anonymous feedback records.
//!
//! An entry is only a rating, the timer mode it was given in and a
//! timestamp. Nothing links it to a person.

mod client;

pub use client::{FeedbackClient, FeedbackGate, FEEDBACK_COOLDOWN};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::Mode;

/// How many entries the summary echoes back.
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Positive,
    Negative,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Positive => "positive",
            Rating::Negative => "negative",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Rating::Positive),
            "negative" => Ok(Rating::Negative),
            _ => Err(ValidationError::InvalidRating),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub rating: Rating,
    pub mode: Mode,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn now(rating: Rating, mode: Mode) -> Self {
        Self {
            rating,
            mode,
            timestamp: Utc::now(),
        }
    }
}

/// Raw request body. Fields stay loose so validation can report which one
/// is wrong instead of failing the whole parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub rating: Option<serde_json::Value>,
    #[serde(default)]
    pub mode: Option<serde_json::Value>,
}

impl FeedbackRequest {
    pub fn new(rating: Rating, mode: Mode) -> Self {
        Self {
            rating: Some(rating.as_str().into()),
            mode: Some(mode.as_str().into()),
        }
    }

    /// Read the fields out of any JSON document. Anything but an object
    /// yields an empty request.
    pub fn from_json(value: serde_json::Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Rating is checked before mode. Non-string values are unknown values.
    pub fn validate(&self) -> Result<(Rating, Mode), ValidationError> {
        let rating = self
            .rating
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .ok_or(ValidationError::InvalidRating)?
            .parse::<Rating>()?;
        let mode = self
            .mode
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .ok_or(ValidationError::InvalidMode)?
            .parse::<Mode>()?;
        Ok((rating, mode))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCounts {
    pub standard: usize,
    pub guided: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub by_mode: ModeCounts,
    pub recent: Vec<FeedbackEntry>,
}

impl FeedbackSummary {
    pub fn from_entries(entries: &[FeedbackEntry]) -> Self {
        let mut summary = FeedbackSummary {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            match entry.rating {
                Rating::Positive => summary.positive += 1,
                Rating::Negative => summary.negative += 1,
            }
            match entry.mode {
                Mode::Standard => summary.by_mode.standard += 1,
                Mode::Guided => summary.by_mode.guided += 1,
            }
        }
        let start = entries.len().saturating_sub(RECENT_LIMIT);
        summary.recent = entries[start..].to_vec();
        summary
    }
}

/// Wire/file body of the success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackAck {
    pub success: bool,
    pub message: String,
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(rating: Rating, mode: Mode, secs: i64) -> FeedbackEntry {
        FeedbackEntry {
            rating,
            mode,
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn validation_checks_rating_first() {
        let req = FeedbackRequest {
            rating: Some("meh".into()),
            mode: Some("nope".into()),
        };
        assert_eq!(req.validate(), Err(ValidationError::InvalidRating));

        let req = FeedbackRequest {
            rating: Some("positive".into()),
            mode: None,
        };
        assert_eq!(req.validate(), Err(ValidationError::InvalidMode));

        let req = FeedbackRequest::default();
        assert_eq!(req.validate(), Err(ValidationError::InvalidRating));

        let req = FeedbackRequest::new(Rating::Negative, Mode::Guided);
        assert_eq!(req.validate(), Ok((Rating::Negative, Mode::Guided)));
    }

    #[test]
    fn non_string_fields_are_unknown_values() {
        let req = FeedbackRequest::from_json(serde_json::json!({ "rating": 5, "mode": "standard" }));
        assert_eq!(req.validate(), Err(ValidationError::InvalidRating));

        let req = FeedbackRequest::from_json(serde_json::json!({ "rating": "positive", "mode": true }));
        assert_eq!(req.validate(), Err(ValidationError::InvalidMode));

        for doc in [serde_json::Value::Null, serde_json::json!(["positive", "guided"]), 7.into()] {
            let req = FeedbackRequest::from_json(doc);
            assert_eq!(req.validate(), Err(ValidationError::InvalidRating));
        }
    }

    #[test]
    fn entry_serializes_like_the_browser_did() {
        let e = entry(Rating::Positive, Mode::Standard, 0);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["rating"], "positive");
        assert_eq!(json["mode"], "standard");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20.000Z");

        let back: FeedbackEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn summary_counts_and_keeps_last_ten() {
        let entries: Vec<_> = (0..15)
            .map(|i| {
                let rating = if i % 3 == 0 {
                    Rating::Negative
                } else {
                    Rating::Positive
                };
                let mode = if i < 5 { Mode::Guided } else { Mode::Standard };
                entry(rating, mode, i)
            })
            .collect();
        let summary = FeedbackSummary::from_entries(&entries);
        assert_eq!(summary.total, 15);
        assert_eq!(summary.negative, 5);
        assert_eq!(summary.positive, 10);
        assert_eq!(summary.by_mode, ModeCounts { standard: 10, guided: 5 });
        assert_eq!(summary.recent.len(), RECENT_LIMIT);
        assert_eq!(summary.recent[0], entries[5]);
        assert_eq!(summary.recent[9], entries[14]);
    }

    #[test]
    fn summary_uses_camel_case_by_mode() {
        let json = serde_json::to_value(FeedbackSummary::default()).unwrap();
        assert!(json.get("byMode").is_some());
        assert_eq!(json["recent"], serde_json::json!([]));
    }
}
