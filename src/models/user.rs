use serde::{Deserialize, Serialize};

use super::{ClickerError, Result};

pub type UserId = i64;

pub const DEFAULT_AVATAR: &str = "default.png";

/// Lifetime click count of a user.
///
/// Stored as a signed SQLite integer; anything negative coming back from
/// storage is a broken invariant and is rejected on load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(transparent)]
pub struct Score(pub u64);

impl Score {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ClickerError;

    fn try_from(raw: i64) -> Result<Self> {
        u64::try_from(raw)
            .map(Score)
            .map_err(|_| ClickerError::InvalidArgument(format!("score must be non-negative, got {}", raw)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub city: Option<String>,
}

impl Location {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ClickerError::InvalidArgument(format!("latitude out of range: {}", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(ClickerError::InvalidArgument(format!("longitude out of range: {}", self.lon)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub clicks: u64,
    pub avatar: String,
    pub location: Option<Location>,
}

impl User {
    pub fn score(&self) -> Score {
        Score(self.clicks)
    }

    pub fn is_admin(&self, admin_username: &str) -> bool {
        self.username == admin_username
    }
}

/// Stored login material for a username.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub password_hash: String,
}

/// A peer as seen by the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerScore {
    pub id: UserId,
    pub username: String,
    pub avatar: String,
    pub clicks: u64,
}

impl From<&User> for PlayerScore {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            clicks: user.clicks,
        }
    }
}

/// Entry on the admin map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserLocation {
    pub user_id: UserId,
    pub username: String,
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_score_rejected() {
        assert!(matches!(Score::try_from(-1i64), Err(ClickerError::InvalidArgument(_))));
        assert_eq!(Score::try_from(0i64).unwrap(), Score(0));
        assert_eq!(Score::try_from(12_345i64).unwrap().value(), 12_345);
    }

    #[test]
    fn test_location_bounds() {
        let ok = Location { lat: 48.85, lon: 2.35, city: Some("Paris".to_string()) };
        assert!(ok.validate().is_ok());

        let bad_lat = Location { lat: 91.0, lon: 0.0, city: None };
        assert!(bad_lat.validate().is_err());

        let bad_lon = Location { lat: 0.0, lon: -180.5, city: None };
        assert!(bad_lon.validate().is_err());
    }
}
