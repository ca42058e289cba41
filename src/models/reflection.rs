use serde::{Deserialize, Deserializer, Serialize};

pub const FALLBACK_RESPONSE: &str = "I'm having trouble processing that, but I'm here for you.";

/// The five labels the model is asked to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Sad,
    Anxious,
    Neutral,
    Productive,
    Happy,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Productive,
        Mood::Neutral,
        Mood::Anxious,
        Mood::Sad,
    ];

    pub fn score(self) -> i64 {
        match self {
            Mood::Sad => 1,
            Mood::Anxious => 2,
            Mood::Neutral => 3,
            Mood::Productive => 4,
            Mood::Happy => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Sad => "Sad",
            Mood::Anxious => "Anxious",
            Mood::Neutral => "Neutral",
            Mood::Productive => "Productive",
            Mood::Happy => "Happy",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|m| m.label() == label)
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured result of one analysis call.
///
/// `mood` and `score` are kept as the model sent them: an unknown label or an
/// out-of-range score survives parsing. Use [`ReflectionRecord::is_consistent`]
/// to check them against the fixed mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionRecord {
    pub response: String,
    pub mood: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub score: i64,
}

/// Accepts `4`, `4.0` and `"4"`; rejects fractions and non-numeric text.
fn deserialize_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn integral(value: f64) -> Option<i64> {
        (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
            .then_some(value as i64)
    }

    let score = match RawScore::deserialize(deserializer)? {
        RawScore::Int(n) => Some(n),
        RawScore::Float(f) => integral(f),
        RawScore::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
    };

    score.ok_or_else(|| serde::de::Error::custom("score is not a whole number"))
}

impl ReflectionRecord {
    pub fn fallback() -> Self {
        Self {
            response: FALLBACK_RESPONSE.into(),
            mood: Mood::Neutral.label().into(),
            score: Mood::Neutral.score(),
        }
    }

    pub fn known_mood(&self) -> Option<Mood> {
        Mood::from_label(&self.mood)
    }

    /// Known label, score in 1..=5, and score equal to the label's value.
    pub fn is_consistent(&self) -> bool {
        match self.known_mood() {
            Some(mood) => (1..=5).contains(&self.score) && mood.score() == self.score,
            None => false,
        }
    }
}
