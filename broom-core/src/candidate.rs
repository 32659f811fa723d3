use std::fmt;

use serde::{Deserialize, Serialize};

/// Day counts at or above this value mean "duration unknown"
pub const UNKNOWN_DURATION_THRESHOLD: u32 = 9000;

/// Value reported for entities whose inactivity duration cannot be determined
pub const UNKNOWN_DURATION: u32 = 9999;

/// Candidate status, compared only by equality.
///
/// The set of values is open; the ones the registry backend produces are
/// exposed as constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn orphaned() -> Self {
        Self::new("orphaned")
    }

    pub fn unavailable() -> Self {
        Self::new("unavailable")
    }

    pub fn unknown() -> Self {
        Self::new("unknown")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A registry entity eligible for cleanup review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique key within one fetched set
    pub entity_id: String,
    /// Display label
    pub name: String,
    /// Integration the entity originates from
    pub platform: String,
    pub status: Status,
    /// Whole days since the entity became unavailable
    pub days_unavailable: u32,
}

impl Candidate {
    pub fn new(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        platform: impl Into<String>,
        status: Status,
        days_unavailable: u32,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            platform: platform.into(),
            status,
            days_unavailable,
        }
    }

    /// Whether `days_unavailable` is the unknown-duration sentinel
    pub fn is_duration_unknown(&self) -> bool {
        self.days_unavailable >= UNKNOWN_DURATION_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        let known = Candidate::new("a", "A", "hue", Status::unavailable(), 8999);
        let unknown = Candidate::new("b", "B", "hue", Status::orphaned(), 9500);
        assert!(!known.is_duration_unknown());
        assert!(unknown.is_duration_unknown());
    }

    #[test]
    fn test_status_is_transparent_in_json() {
        let c = Candidate::new("sensor.x", "X", "zha", Status::new("orphaned"), 3);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"status\":\"orphaned\""));
        let back: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
