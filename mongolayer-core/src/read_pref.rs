//! Read preference modes.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::MongoError;

/// Which replica-set members may serve read operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum ReadMode {
    /// Only the primary.
    Primary,
    /// The primary, or a secondary when the primary is unavailable.
    PrimaryPreferred,
    /// Only secondaries.
    Secondary,
    /// Secondaries, or the primary when no secondary is available.
    #[default]
    SecondaryPreferred,
    /// The member with the lowest network latency.
    Nearest,
}

impl ReadMode {
    pub const ALL: [ReadMode; 5] = [
        ReadMode::Primary,
        ReadMode::PrimaryPreferred,
        ReadMode::Secondary,
        ReadMode::SecondaryPreferred,
        ReadMode::Nearest,
    ];

    /// The mode name as it appears in a connection string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadMode::Primary => "primary",
            ReadMode::PrimaryPreferred => "primaryPreferred",
            ReadMode::Secondary => "secondary",
            ReadMode::SecondaryPreferred => "secondaryPreferred",
            ReadMode::Nearest => "nearest",
        }
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadMode {
    type Err = MongoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MongoError::InvalidArgument(format!("unknown read preference mode '{s}'")))
    }
}

impl TryFrom<String> for ReadMode {
    type Error = MongoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("primary".parse::<ReadMode>().unwrap(), ReadMode::Primary);
        assert_eq!("SecondaryPreferred".parse::<ReadMode>().unwrap(), ReadMode::SecondaryPreferred);
        assert_eq!(" nearest ".parse::<ReadMode>().unwrap(), ReadMode::Nearest);
        assert_eq!("primarypreferred".parse::<ReadMode>().unwrap(), ReadMode::PrimaryPreferred);
    }

    #[test]
    fn test_parse_rejects_unknown_modes() {
        let err = "tertiary".parse::<ReadMode>().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in ReadMode::ALL {
            assert_eq!(mode.to_string().parse::<ReadMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_deserialize_matches_parse() {
        for name in ["Primary", "primaryPreferred", "SECONDARY", "secondarypreferred", " nearest "] {
            let from_json: ReadMode = serde_json::from_str(&format!("\"{name}\"")).unwrap();
            assert_eq!(from_json, name.parse::<ReadMode>().unwrap());
        }

        assert!(serde_json::from_str::<ReadMode>("\"tertiary\"").is_err());
        assert_eq!(serde_json::to_string(&ReadMode::PrimaryPreferred).unwrap(), "\"primaryPreferred\"");
    }

    #[test]
    fn test_default_is_secondary_preferred() {
        assert_eq!(ReadMode::default(), ReadMode::SecondaryPreferred);
    }
}
