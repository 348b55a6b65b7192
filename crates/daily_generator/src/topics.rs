use std::sync::Arc;

use common::{ServiceError, ServiceResult};
use time::{OffsetDateTime, UtcOffset};

const MILLIS_PER_DAY: i128 = 86_400_000;

pub const DEFAULT_TOPICS: [&str; 8] = [
    "Software architecture and the trade-offs behind system design decisions",
    "The history of computing and the ideas that shaped modern technology",
    "Focus, productivity and sustainable habits for knowledge workers",
    "Security and privacy in the technology people use every day",
    "Data literacy: statistics, charts and reasoning about numbers",
    "Recent scientific discoveries explained for curious non-specialists",
    "Leadership, collaboration and healthy engineering teams",
    "Open source communities and the economics of shared software",
];

/// Read-only ordered topic table. The topic for a day depends only on the
/// date, never on what was generated before.
#[derive(Debug, Clone)]
pub struct TopicSchedule {
    topics: Arc<[String]>,
}

impl Default for TopicSchedule {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl TopicSchedule {
    pub fn new(topics: Vec<String>) -> ServiceResult<Self> {
        if topics.is_empty() {
            return Err(ServiceError::Config(anyhow::anyhow!("topic table must not be empty")));
        }
        Ok(Self { topics: topics.into() })
    }

    /// Uses the built-in table when `topics` is empty.
    pub fn from_config(topics: &[String]) -> Self {
        Self::new(topics.to_vec()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn pick_topic_for_today(&self, now: OffsetDateTime) -> &str {
        let slot = day_index(now).rem_euclid(self.topics.len() as i64) as usize;
        &self.topics[slot]
    }
}

/// Whole UTC days since the Unix epoch, floored.
pub fn day_index(now: OffsetDateTime) -> i64 {
    let millis = now.unix_timestamp_nanos().div_euclid(1_000_000);
    millis.div_euclid(MILLIS_PER_DAY) as i64
}

/// `YYYY-MM-DD` of the UTC calendar day containing `now`.
pub fn utc_date(now: OffsetDateTime) -> String {
    now.to_offset(UtcOffset::UTC).date().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    #[test]
    fn same_utc_day_maps_to_same_topic() {
        let schedule = TopicSchedule::default();
        let morning = datetime!(2024-03-05 00:00:00 UTC);
        let night = datetime!(2024-03-05 23:59:59.999 UTC);
        assert_eq!(schedule.pick_topic_for_today(morning), schedule.pick_topic_for_today(night));
        assert_eq!(day_index(morning), day_index(night));
    }

    #[test]
    fn eight_consecutive_days_cycle_in_order() {
        let schedule = TopicSchedule::default();
        let start = datetime!(1970-01-01 12:00 UTC);

        let picked: Vec<_> = (0..8)
            .map(|d| schedule.pick_topic_for_today(start + Duration::days(d)).to_string())
            .collect();
        assert_eq!(picked, DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect::<Vec<_>>());

        let ninth = schedule.pick_topic_for_today(start + Duration::days(8));
        assert_eq!(ninth, DEFAULT_TOPICS[0]);
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let local = datetime!(2024-03-05 23:30 -05:00);
        assert_eq!(utc_date(local), "2024-03-06");
        assert_eq!(day_index(local), day_index(datetime!(2024-03-06 04:30 UTC)));
    }

    #[test]
    fn empty_table_falls_back_to_defaults() {
        assert!(TopicSchedule::new(Vec::new()).is_err());
        assert_eq!(TopicSchedule::from_config(&[]).len(), 8);

        let custom = TopicSchedule::from_config(&["only".to_string()]);
        assert_eq!(custom.pick_topic_for_today(datetime!(2030-07-01 0:00 UTC)), "only");
    }
}
