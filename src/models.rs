//! Data models for study items, decks and review payloads.
//!
//! Decks arrive in the shapes the Recallify backend serves them:
//! `{ "title", "mcqs": [...] }`, `{ "title", "cards": [...] }` or a bare
//! array of items. Every item carries its scheduling state flattened next
//! to its content (`interval_hours`, `ef`, `repetitions`, `srsType`).

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Grade for how well an item was recalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    Again = 1, // Forgot
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Again),
            '2' => Some(Self::Hard),
            '3' => Some(Self::Good),
            '4' => Some(Self::Easy),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    /// A lapse resets the item's repetition streak.
    pub fn is_lapse(self) -> bool {
        self.value() < 2
    }

    pub fn label(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::En, Self::Again) => "Again",
            (Language::En, Self::Hard) => "Hard",
            (Language::En, Self::Good) => "Good",
            (Language::En, Self::Easy) => "Easy",
            (Language::Ko, Self::Again) => "매우 어려움",
            (Language::Ko, Self::Hard) => "어려움",
            (Language::Ko, Self::Good) => "보통",
            (Language::Ko, Self::Easy) => "쉬움",
        }
    }
}

impl TryFrom<u8> for Grade {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            other => Err(Error::InvalidArgument(format!(
                "grade must be between 1 and 4, got {other}"
            ))),
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

/// Interface language for grade labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

/// Which study bucket the backend has placed an item in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SrsBucket {
    #[serde(rename = "newC")]
    #[default]
    New,
    #[serde(rename = "learn")]
    Learning,
    #[serde(rename = "due")]
    Due,
    /// Reviewed and not due yet; never enters a session.
    #[serde(other, rename = "scheduled")]
    Scheduled,
}

impl SrsBucket {
    pub fn is_studyable(self) -> bool {
        matches!(self, Self::New | Self::Learning | Self::Due)
    }
}

pub const DEFAULT_EASINESS: f64 = 2.5;

fn default_easiness() -> f64 {
    DEFAULT_EASINESS
}

/// `null` reads as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn easiness_or_default<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_EASINESS))
}

/// Scheduling state of one item as last persisted by the backend. Missing
/// and `null` fields both fall back to a new item's state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub interval_hours: f64,
    #[serde(
        rename = "ef",
        default = "default_easiness",
        deserialize_with = "easiness_or_default"
    )]
    pub easiness_factor: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repetitions: u32,
    #[serde(rename = "srsType", default, deserialize_with = "null_as_default")]
    pub srs_bucket: SrsBucket,
}

impl ReviewState {
    pub fn new(easiness_factor: f64, repetitions: u32, interval_hours: f64) -> Self {
        Self {
            interval_hours,
            easiness_factor,
            repetitions,
            srs_bucket: SrsBucket::default(),
        }
    }
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::new(DEFAULT_EASINESS, 0, 0.0)
    }
}

/// Backend ids come as strings or numbers.
fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// One answer choice of a multiple-choice question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McqOption {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub option: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default, alias = "prompt")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<McqOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub review: ReviewState,
}

impl Question {
    pub fn correct_option(&self) -> Option<&McqOption> {
        self.options.iter().find(|o| o.correct)
    }

    pub fn option(&self, id: &str) -> Option<&McqOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn is_correct(&self, option_id: &str) -> bool {
        self.correct_option().map_or(false, |o| o.id == option_id)
    }

    /// Explanation shown for the correct answer, falling back to the
    /// question-level one.
    pub fn correct_explanation(&self) -> &str {
        self.correct_option()
            .and_then(|o| o.explanation.as_deref())
            .filter(|e| !e.is_empty())
            .or(self.explanation.as_deref().filter(|e| !e.is_empty()))
            .unwrap_or("This is the correct choice.")
    }
}

/// A two-sided flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(flatten)]
    pub review: ReviewState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    Mcq,
    Flashcard,
}

impl DeckKind {
    pub fn default_title(self) -> &'static str {
        match self {
            Self::Mcq => "MCQ Deck",
            Self::Flashcard => "Flashcard Deck",
        }
    }

    pub fn item_noun(self) -> &'static str {
        match self {
            Self::Mcq => "questions",
            Self::Flashcard => "cards",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeckItems {
    Mcq(Vec<Question>),
    Flashcards(Vec<Flashcard>),
}

/// Statistics for a deck, counted per SRS bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeckStats {
    pub total_items: usize,
    pub new_items: usize,
    pub learning_items: usize,
    pub due_items: usize,
}

impl DeckStats {
    pub(crate) fn from_buckets(buckets: impl Iterator<Item = SrsBucket>) -> Self {
        let mut stats = Self::default();
        for bucket in buckets {
            stats.total_items += 1;
            match bucket {
                SrsBucket::New => stats.new_items += 1,
                SrsBucket::Learning => stats.learning_items += 1,
                SrsBucket::Due => stats.due_items += 1,
                SrsBucket::Scheduled => {}
            }
        }
        stats
    }

    pub fn studyable(&self) -> usize {
        self.new_items + self.learning_items + self.due_items
    }
}

/// A question set or flashcard set.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: String,
    pub title: String,
    pub items: DeckItems,
}

impl Deck {
    /// Parse a backend payload. Returns `Ok(None)` when the JSON is valid
    /// but matches none of the known deck shapes, i.e. a scalar or an array
    /// of unrecognised items.
    pub fn from_json(id: &str, json: &str) -> Result<Option<Self>> {
        let value: Value = serde_json::from_str(json)?;

        let title = value
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        // Payloads with no items are empty question sets
        let (items, kind) = match value {
            Value::Array(items) if items.is_empty() => (items, Some(DeckKind::Mcq)),
            Value::Array(items) => {
                let kind = items.first().and_then(detect_kind);
                (items, kind)
            }
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.remove("mcqs") {
                    (items, Some(DeckKind::Mcq))
                } else if let Some(Value::Array(items)) = map.remove("cards") {
                    (items, Some(DeckKind::Flashcard))
                } else {
                    (Vec::new(), Some(DeckKind::Mcq))
                }
            }
            _ => return Ok(None),
        };

        let Some(kind) = kind else {
            return Ok(None);
        };

        let items = match kind {
            DeckKind::Mcq => {
                let mut questions: Vec<Question> = serde_json::from_value(Value::Array(items))?;
                for (i, q) in questions.iter_mut().enumerate() {
                    if q.id.is_empty() {
                        q.id = i.to_string();
                    }
                }
                DeckItems::Mcq(questions)
            }
            DeckKind::Flashcard => {
                let mut cards: Vec<Flashcard> = serde_json::from_value(Value::Array(items))?;
                for (i, c) in cards.iter_mut().enumerate() {
                    if c.id.is_empty() {
                        c.id = i.to_string();
                    }
                }
                DeckItems::Flashcards(cards)
            }
        };

        Ok(Some(Self {
            id: id.to_string(),
            title: title.unwrap_or_else(|| kind.default_title().to_string()),
            items,
        }))
    }

    pub fn kind(&self) -> DeckKind {
        match self.items {
            DeckItems::Mcq(_) => DeckKind::Mcq,
            DeckItems::Flashcards(_) => DeckKind::Flashcard,
        }
    }

    pub fn len(&self) -> usize {
        match &self.items {
            DeckItems::Mcq(q) => q.len(),
            DeckItems::Flashcards(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_stats(&self) -> DeckStats {
        match &self.items {
            DeckItems::Mcq(q) => DeckStats::from_buckets(q.iter().map(|q| q.review.srs_bucket)),
            DeckItems::Flashcards(c) => {
                DeckStats::from_buckets(c.iter().map(|c| c.review.srs_bucket))
            }
        }
    }
}

fn detect_kind(item: &Value) -> Option<DeckKind> {
    let obj = item.as_object()?;
    if obj.contains_key("options") || obj.contains_key("question") || obj.contains_key("prompt") {
        Some(DeckKind::Mcq)
    } else if obj.contains_key("front") || obj.contains_key("back") {
        Some(DeckKind::Flashcard)
    } else {
        None
    }
}

/// Body of a grade update: the grade plus the pre-review state, so the
/// backend can recompute the schedule authoritatively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub grade: Grade,
    pub ef: f64,
    pub interval_hours: f64,
    pub repetitions: u32,
}

impl ReviewSubmission {
    pub fn from_state(grade: Grade, state: &ReviewState) -> Self {
        Self {
            grade,
            ef: state.easiness_factor,
            interval_hours: state.interval_hours,
            repetitions: state.repetitions,
        }
    }
}

/// A grade update waiting in the outbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub item_id: String,
    pub kind: DeckKind,
    #[serde(flatten)]
    pub submission: ReviewSubmission,
    pub queued_at: DateTime<Local>,
}

/// Final score of an MCQ session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "setId")]
    pub set_id: String,
    pub score: usize,
    pub queued_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mcq_object() {
        let json = r#"{
            "title": "Cell Biology",
            "mcqs": [{
                "id": 7,
                "prompt": "Powerhouse of the cell?",
                "options": [
                    {"id": "A", "option": "Nucleus"},
                    {"id": "B", "option": "Mitochondria", "correct": true, "explanation": "ATP"}
                ],
                "interval_hours": 24, "ef": 2.36, "repetitions": 1, "srsType": "learn"
            }]
        }"#;

        let deck = Deck::from_json("bio", json).unwrap().unwrap();
        assert_eq!(deck.title, "Cell Biology");
        assert_eq!(deck.kind(), DeckKind::Mcq);

        let DeckItems::Mcq(questions) = &deck.items else {
            panic!("expected MCQ deck");
        };
        let q = &questions[0];
        assert_eq!(q.id, "7");
        assert_eq!(q.question, "Powerhouse of the cell?");
        assert_eq!(q.correct_option().unwrap().id, "B");
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("A"));
        assert_eq!(q.correct_explanation(), "ATP");
        assert_eq!(q.review.srs_bucket, SrsBucket::Learning);
        assert_eq!(q.review.repetitions, 1);
        assert!((q.review.easiness_factor - 2.36).abs() < 1e-9);
    }

    #[test]
    fn test_parse_bare_flashcard_array_defaults() {
        let json = r#"[{"front": "hola", "back": "hello"}, {"id": "x", "front": "adiós", "back": "bye"}]"#;
        let deck = Deck::from_json("spanish", json).unwrap().unwrap();

        assert_eq!(deck.title, "Flashcard Deck");
        assert_eq!(deck.len(), 2);
        let DeckItems::Flashcards(cards) = &deck.items else {
            panic!("expected flashcard deck");
        };
        assert_eq!(cards[0].id, "0");
        assert_eq!(cards[1].id, "x");
        assert_eq!(cards[0].review, ReviewState::default());
    }

    #[test]
    fn test_unknown_shapes() {
        assert!(Deck::from_json("c", "42").unwrap().is_none());
        assert!(Deck::from_json("e", r#"[{"colour": "red"}]"#).unwrap().is_none());
        assert!(Deck::from_json("d", "{not json").is_err());
    }

    #[test]
    fn test_payloads_without_items_are_empty_decks() {
        let titled = Deck::from_json("a", r#"{"title": "Week 3"}"#).unwrap().unwrap();
        assert_eq!(titled.title, "Week 3");
        assert_eq!(titled.kind(), DeckKind::Mcq);
        assert!(titled.is_empty());

        let bare = Deck::from_json("b", "[]").unwrap().unwrap();
        assert_eq!(bare.title, "MCQ Deck");
        assert!(bare.is_empty());
        assert_eq!(bare.get_stats().studyable(), 0);

        let null_items = Deck::from_json("n", r#"{"title": "x", "mcqs": null}"#).unwrap().unwrap();
        assert!(null_items.is_empty());
    }

    #[test]
    fn test_unknown_bucket_is_scheduled() {
        let state: ReviewState =
            serde_json::from_str(r#"{"interval_hours": 5, "ef": 2.5, "repetitions": 2, "srsType": "mature"}"#)
                .unwrap();
        assert_eq!(state.srs_bucket, SrsBucket::Scheduled);
        assert!(!state.srs_bucket.is_studyable());
    }

    #[test]
    fn test_null_scheduling_fields_read_as_new_item() {
        let json = r#"{"cards": [
            {"id": 1, "front": "a", "back": "b",
             "interval_hours": null, "ef": null, "repetitions": null, "srsType": null},
            {"id": 2, "front": "c", "back": "d", "ef": 2.1, "repetitions": 3}
        ]}"#;
        let deck = Deck::from_json("nulls", json).unwrap().unwrap();
        let DeckItems::Flashcards(cards) = &deck.items else {
            panic!("expected flashcard deck");
        };
        assert_eq!(cards[0].review, ReviewState::default());
        assert_eq!(cards[1].review.easiness_factor, 2.1);
        assert_eq!(cards[1].review.repetitions, 3);
        assert_eq!(cards[1].review.interval_hours, 0.0);
    }

    #[test]
    fn test_stats_by_bucket() {
        let json = r#"[
            {"front": "a", "back": "1", "srsType": "newC"},
            {"front": "b", "back": "2", "srsType": "learn"},
            {"front": "c", "back": "3", "srsType": "due"},
            {"front": "d", "back": "4", "srsType": "due"},
            {"front": "e", "back": "5", "srsType": "later"}
        ]"#;
        let stats = Deck::from_json("s", json).unwrap().unwrap().get_stats();
        assert_eq!(
            stats,
            DeckStats {
                total_items: 5,
                new_items: 1,
                learning_items: 1,
                due_items: 2,
            }
        );
        assert_eq!(stats.studyable(), 4);
    }

    #[test]
    fn test_grade_conversion() {
        assert_eq!(Grade::try_from(3).unwrap(), Grade::Good);
        assert!(matches!(Grade::try_from(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(Grade::try_from(5), Err(Error::InvalidArgument(_))));
        assert_eq!(Grade::from_key('4'), Some(Grade::Easy));
        assert_eq!(Grade::from_key('5'), None);
        assert_eq!(Grade::Again.label(Language::Ko), "매우 어려움");
    }

    #[test]
    fn test_submission_wire_shape() {
        let state = ReviewState::new(2.3, 4, 72.0);
        let submission = ReviewSubmission::from_state(Grade::Hard, &state);
        let json = serde_json::to_value(submission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"grade": 2, "ef": 2.3, "interval_hours": 72.0, "repetitions": 4})
        );
    }
}
