use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which a quiz score is kept.
pub const QUIZ_KEY: &str = "quiz";

/// Key under which the score for one coding problem is kept.
pub fn problem_key(problem_id: i32) -> String {
    format!("problem:{problem_id}")
}

/// Best score per scoring key for one (user, event) pair.
///
/// A quiz has a single `quiz` entry; a coding contest has one entry per
/// problem. The event total is the sum of the entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBreakdown(BTreeMap<String, f64>);

impl ScoreBreakdown {
    /// Decode a stored breakdown. Anything that is not a key → number map is an error.
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }

    /// Record `points` under `key` if it beats the stored score.
    ///
    /// Returns true when the stored score changed.
    pub fn offer(&mut self, key: &str, points: f64) -> bool {
        match self.0.get(key) {
            Some(&best) if best >= points => false,
            _ => {
                self.0.insert(key.to_string(), points);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}
