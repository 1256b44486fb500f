//! Session options and difficulty presets
//!
//! Supplied by the host at session start, typically as JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Aim jitter half-range for this preset (radians)
    pub fn aim_jitter(&self) -> f64 {
        match self {
            Difficulty::Easy => DEFAULT_AIM_JITTER * 0.5,
            Difficulty::Normal => DEFAULT_AIM_JITTER,
            Difficulty::Hard => DEFAULT_AIM_JITTER * 2.0,
        }
    }

    /// Target sweep time from one extreme to the other (ms)
    pub fn target_half_period_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => DEFAULT_TARGET_HALF_PERIOD_MS * 1.5,
            Difficulty::Normal => DEFAULT_TARGET_HALF_PERIOD_MS,
            Difficulty::Hard => DEFAULT_TARGET_HALF_PERIOD_MS * 0.6,
        }
    }
}

/// Options for one archery session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
    /// Arrows per session
    pub max_arrows: u32,
    /// Session clock length
    pub session_duration_seconds: u32,
    /// Aim jitter half-range (radians); 0 disables jitter
    pub aim_jitter: f64,
    /// Target sweep time between extremes (ms)
    pub target_half_period_ms: f64,
    /// Keep the target at rest instead of oscillating
    pub stationary_target: bool,
    /// RNG seed for aim jitter
    pub seed: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_arrows: DEFAULT_MAX_ARROWS,
            session_duration_seconds: DEFAULT_SESSION_SECONDS,
            aim_jitter: DEFAULT_AIM_JITTER,
            target_half_period_ms: DEFAULT_TARGET_HALF_PERIOD_MS,
            stationary_target: false,
            seed: 0,
        }
    }
}

impl SessionOptions {
    /// Create options from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut options = Self::default();
        options.apply_difficulty(difficulty);
        options
    }

    /// Apply a difficulty preset (updates jitter and target speed)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.aim_jitter = difficulty.aim_jitter();
        self.target_half_period_ms = difficulty.target_half_period_ms();
    }

    /// Parse host-supplied JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Clamp values into their usable ranges
    pub fn validated(mut self) -> Self {
        if self.max_arrows == 0 {
            log::warn!("max_arrows must be at least 1, using 1");
            self.max_arrows = 1;
        }
        if self.session_duration_seconds == 0 {
            log::warn!("session_duration_seconds must be at least 1, using 1");
            self.session_duration_seconds = 1;
        }
        if !self.aim_jitter.is_finite() || self.aim_jitter < 0.0 {
            log::warn!("Invalid aim_jitter {}, using default", self.aim_jitter);
            self.aim_jitter = DEFAULT_AIM_JITTER;
        }
        if !self.target_half_period_ms.is_finite() || self.target_half_period_ms <= 0.0 {
            log::warn!(
                "Invalid target_half_period_ms {}, using default",
                self.target_half_period_ms
            );
            self.target_half_period_ms = DEFAULT_TARGET_HALF_PERIOD_MS;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.max_arrows, 10);
        assert_eq!(options.session_duration_seconds, 60);
        assert!(!options.stationary_target);
    }

    #[test]
    fn test_from_json_partial() {
        let options = SessionOptions::from_json(r#"{"maxArrows": 3}"#).expect("valid json");
        assert_eq!(options.max_arrows, 3);
        assert_eq!(options.session_duration_seconds, 60);
        assert_eq!(options.aim_jitter, DEFAULT_AIM_JITTER);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(SessionOptions::from_json("not json").is_err());
        assert!(SessionOptions::from_json(r#"{"maxArrows": -1}"#).is_err());
    }

    #[test]
    fn test_validation_clamps() {
        let options = SessionOptions::from_json(
            r#"{"maxArrows": 0, "sessionDurationSeconds": 0, "aimJitter": -1.0, "targetHalfPeriodMs": 0.0}"#,
        )
        .expect("valid json");
        assert_eq!(options.max_arrows, 1);
        assert_eq!(options.session_duration_seconds, 1);
        assert_eq!(options.aim_jitter, DEFAULT_AIM_JITTER);
        assert_eq!(options.target_half_period_ms, DEFAULT_TARGET_HALF_PERIOD_MS);
    }

    #[test]
    fn test_json_round_trip() {
        let options = SessionOptions {
            seed: 42,
            ..SessionOptions::from_difficulty(Difficulty::Hard)
        };
        let json = options.to_json().expect("serializable");
        let parsed = SessionOptions::from_json(&json).expect("parses");
        assert_eq!(parsed.seed, 42);
        assert_eq!(parsed.max_arrows, options.max_arrows);
        assert!((parsed.aim_jitter - options.aim_jitter).abs() < 1e-12);
        assert!((parsed.target_half_period_ms - options.target_half_period_ms).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_presets() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        assert_eq!(Difficulty::default().as_str(), "Normal");

        let easy = SessionOptions::from_difficulty(Difficulty::Easy);
        let hard = SessionOptions::from_difficulty(Difficulty::Hard);
        assert!(easy.aim_jitter < hard.aim_jitter);
        assert!(easy.target_half_period_ms > hard.target_half_period_ms);
    }
}
