//! Study sessions for MCQ sets and flashcard sets.
//!
//! Both sessions only take items the backend marked new, learning or due,
//! label their grade buttons with the shared interval preview, and hand
//! back a [`PendingReview`] per graded item carrying the pre-review state.

use chrono::Local;
use log::debug;

use crate::error::{Error, Result};
use crate::models::{
    DeckKind, DeckStats, Flashcard, Grade, Language, PendingReview, Question, ReviewState,
    ReviewSubmission,
};
use crate::schedule;

/// A grade button with its preview label, e.g. `Good (6.0d)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeButton {
    pub grade: Grade,
    pub label: &'static str,
    pub interval: String,
}

fn grade_buttons(
    state: &ReviewState,
    grades: &[Grade],
    language: Language,
) -> Result<Vec<GradeButton>> {
    grades
        .iter()
        .map(|&grade| {
            Ok(GradeButton {
                grade,
                label: grade.label(language),
                interval: schedule::estimate(grade, state)?.label(),
            })
        })
        .collect()
}

fn pending(item_id: &str, kind: DeckKind, grade: Grade, state: &ReviewState) -> PendingReview {
    PendingReview {
        item_id: item_id.to_string(),
        kind,
        submission: ReviewSubmission::from_state(grade, state),
        queued_at: Local::now(),
    }
}

fn progress_pct(index: usize, total: usize) -> u16 {
    if total == 0 {
        0
    } else {
        ((index as f64 / total as f64) * 100.0).round() as u16
    }
}

// ══════════════════════════════════════════════════════════════════════════
// MCQ Session
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct McqSession {
    questions: Vec<Question>,
    index: usize,
    selected: Option<String>,
    revealed: bool,
    score: usize,
    finished: bool,
    language: Language,
}

impl McqSession {
    pub fn new(questions: Vec<Question>, language: Language) -> Self {
        let questions: Vec<Question> = questions
            .into_iter()
            .filter(|q| q.review.srs_bucket.is_studyable())
            .collect();
        debug!("MCQ session with {} questions", questions.len());

        Self {
            finished: questions.is_empty(),
            questions,
            index: 0,
            selected: None,
            revealed: false,
            score: 0,
            language,
        }
    }

    pub fn current(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn progress_pct(&self) -> u16 {
        progress_pct(self.index, self.total())
    }

    /// Bucket counts for the questions not graded yet.
    pub fn remaining_stats(&self) -> DeckStats {
        let start = if self.finished { self.questions.len() } else { self.index };
        DeckStats::from_buckets(self.questions[start..].iter().map(|q| q.review.srs_bucket))
    }

    /// Selects an option by id. Ignored once the answer is revealed.
    pub fn select(&mut self, option_id: &str) -> bool {
        if self.revealed {
            return false;
        }
        let Some(q) = self.current() else {
            return false;
        };
        if q.option(option_id).is_none() {
            return false;
        }
        self.selected = Some(option_id.to_string());
        true
    }

    /// Selects the option at a 0-based position.
    pub fn select_index(&mut self, position: usize) -> bool {
        let Some(id) = self
            .current()
            .and_then(|q| q.options.get(position))
            .map(|o| o.id.clone())
        else {
            return false;
        };
        self.select(&id)
    }

    /// Reveals the answer and scores the selection. Returns whether the
    /// selection was correct, or `None` when nothing was selected.
    pub fn submit(&mut self) -> Option<bool> {
        if self.revealed {
            return None;
        }
        let selected = self.selected.as_deref()?;
        let correct = self.current()?.is_correct(selected);
        if correct {
            self.score += 1;
        }
        self.revealed = true;
        Some(correct)
    }

    pub fn answered_correctly(&self) -> bool {
        match (self.current(), self.selected.as_deref()) {
            (Some(q), Some(sel)) => q.is_correct(sel),
            _ => false,
        }
    }

    /// Grades offered after reveal: Good and Easy for a correct answer,
    /// Again and Hard otherwise.
    pub fn available_grades(&self) -> &'static [Grade] {
        if !self.revealed {
            &[]
        } else if self.answered_correctly() {
            &[Grade::Good, Grade::Easy]
        } else {
            &[Grade::Again, Grade::Hard]
        }
    }

    pub fn grade_buttons(&self) -> Result<Vec<GradeButton>> {
        match self.current() {
            Some(q) => grade_buttons(&q.review, self.available_grades(), self.language),
            None => Ok(Vec::new()),
        }
    }

    /// Grades the revealed question and moves on.
    pub fn grade(&mut self, grade: Grade) -> Result<PendingReview> {
        if !self.available_grades().contains(&grade) {
            return Err(Error::InvalidArgument(format!(
                "grade {} is not offered for this question",
                grade.value()
            )));
        }
        let q = self
            .current()
            .ok_or_else(|| Error::InvalidArgument("session is finished".to_string()))?;
        let review = pending(&q.id, DeckKind::Mcq, grade, &q.review);

        self.advance();
        Ok(review)
    }

    fn advance(&mut self) {
        if self.index + 1 >= self.questions.len() {
            self.finished = true;
            return;
        }
        self.index += 1;
        self.selected = None;
        self.revealed = false;
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Flashcard Session
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct FlashcardSession {
    cards: Vec<Flashcard>,
    index: usize,
    revealed: bool,
    known: usize,
    finished: bool,
    language: Language,
}

impl FlashcardSession {
    pub fn new(cards: Vec<Flashcard>, language: Language) -> Self {
        let cards: Vec<Flashcard> = cards
            .into_iter()
            .filter(|c| c.review.srs_bucket.is_studyable())
            .collect();
        debug!("Flashcard session with {} cards", cards.len());

        Self {
            finished: cards.is_empty(),
            cards,
            index: 0,
            revealed: false,
            known: 0,
            language,
        }
    }

    pub fn current(&self) -> Option<&Flashcard> {
        if self.finished {
            return None;
        }
        self.cards.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    /// Cards graded Good or Easy.
    pub fn known(&self) -> usize {
        self.known
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn progress_pct(&self) -> u16 {
        progress_pct(self.index, self.total())
    }

    pub fn remaining_stats(&self) -> DeckStats {
        let start = if self.finished { self.cards.len() } else { self.index };
        DeckStats::from_buckets(self.cards[start..].iter().map(|c| c.review.srs_bucket))
    }

    pub fn flip(&mut self) {
        if self.current().is_some() {
            self.revealed = !self.revealed;
        }
    }

    pub fn grade_buttons(&self) -> Result<Vec<GradeButton>> {
        match self.current() {
            Some(card) if self.revealed => grade_buttons(&card.review, &Grade::ALL, self.language),
            _ => Ok(Vec::new()),
        }
    }

    pub fn grade(&mut self, grade: Grade) -> Result<PendingReview> {
        if !self.revealed {
            return Err(Error::InvalidArgument(
                "flip the card before grading it".to_string(),
            ));
        }
        let card = self
            .current()
            .ok_or_else(|| Error::InvalidArgument("session is finished".to_string()))?;
        let review = pending(&card.id, DeckKind::Flashcard, grade, &card.review);

        if grade.value() >= Grade::Good.value() {
            self.known += 1;
        }
        if self.index + 1 >= self.cards.len() {
            self.finished = true;
        } else {
            self.index += 1;
            self.revealed = false;
        }
        Ok(review)
    }

    /// Starts the same cards over.
    pub fn restart(&mut self) {
        self.index = 0;
        self.revealed = false;
        self.known = 0;
        self.finished = self.cards.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{McqOption, SrsBucket};

    fn question(id: &str, bucket: SrsBucket, repetitions: u32) -> Question {
        Question {
            id: id.to_string(),
            question: format!("Question {id}"),
            options: ["A", "B", "C", "D"]
                .iter()
                .map(|o| McqOption {
                    id: o.to_string(),
                    option: format!("Option {o}"),
                    correct: *o == "C",
                    explanation: None,
                })
                .collect(),
            explanation: None,
            review: ReviewState {
                srs_bucket: bucket,
                ..ReviewState::new(2.5, repetitions, 24.0)
            },
        }
    }

    fn card(id: &str, bucket: SrsBucket) -> Flashcard {
        Flashcard {
            id: id.to_string(),
            front: format!("front {id}"),
            back: format!("back {id}"),
            review: ReviewState {
                srs_bucket: bucket,
                ..ReviewState::default()
            },
        }
    }

    #[test]
    fn test_mcq_filters_unscheduled() {
        let session = McqSession::new(
            vec![
                question("1", SrsBucket::New, 0),
                question("2", SrsBucket::Scheduled, 3),
                question("3", SrsBucket::Due, 2),
            ],
            Language::En,
        );
        assert_eq!(session.total(), 2);
        assert_eq!(session.current().unwrap().id, "1");
    }

    #[test]
    fn test_mcq_correct_answer_flow() {
        let mut session = McqSession::new(
            vec![question("1", SrsBucket::Learning, 1), question("2", SrsBucket::Due, 0)],
            Language::En,
        );

        assert!(session.grade_buttons().unwrap().is_empty());
        assert_eq!(session.submit(), None);

        assert!(session.select_index(2));
        assert_eq!(session.selected(), Some("C"));
        assert_eq!(session.submit(), Some(true));
        assert_eq!(session.score(), 1);
        assert!(!session.select("A"));

        let buttons = session.grade_buttons().unwrap();
        assert_eq!(
            buttons,
            vec![
                GradeButton { grade: Grade::Good, label: "Good", interval: "6.0d".to_string() },
                GradeButton { grade: Grade::Easy, label: "Easy", interval: "12.0d".to_string() },
            ]
        );

        assert!(session.grade(Grade::Again).is_err());
        let review = session.grade(Grade::Easy).unwrap();
        assert_eq!(review.item_id, "1");
        assert_eq!(review.kind, DeckKind::Mcq);
        assert_eq!(review.submission.grade, Grade::Easy);
        assert_eq!(review.submission.repetitions, 1);
        assert_eq!(review.submission.interval_hours, 24.0);

        assert_eq!(session.index(), 1);
        assert_eq!(session.progress_pct(), 50);
        assert!(!session.is_revealed());
    }

    #[test]
    fn test_remaining_stats_shrink_as_items_are_graded() {
        let mut session = McqSession::new(
            vec![
                question("1", SrsBucket::New, 0),
                question("2", SrsBucket::Learning, 1),
                question("3", SrsBucket::Due, 2),
            ],
            Language::En,
        );
        let stats = session.remaining_stats();
        assert_eq!((stats.new_items, stats.learning_items, stats.due_items), (1, 1, 1));

        session.select("C");
        session.submit();
        session.grade(Grade::Good).unwrap();
        let stats = session.remaining_stats();
        assert_eq!((stats.new_items, stats.learning_items, stats.due_items), (0, 1, 1));

        for _ in 0..2 {
            session.select("A");
            session.submit();
            session.grade(Grade::Again).unwrap();
        }
        assert!(session.is_finished());
        assert_eq!(session.remaining_stats().studyable(), 0);
    }

    #[test]
    fn test_mcq_wrong_answer_offers_lapse_grades() {
        let mut session = McqSession::new(vec![question("1", SrsBucket::New, 0)], Language::Ko);
        assert!(!session.select("Z"));
        assert!(session.select("A"));
        assert_eq!(session.submit(), Some(false));
        assert_eq!(session.score(), 0);

        let buttons = session.grade_buttons().unwrap();
        assert_eq!(buttons[0].grade, Grade::Again);
        assert_eq!(buttons[0].label, "매우 어려움");
        assert_eq!(buttons[0].interval, "1.0h");
        assert_eq!(buttons[1].grade, Grade::Hard);
        assert_eq!(buttons[1].interval, "12.0h");

        session.grade(Grade::Hard).unwrap();
        assert!(session.is_finished());
        assert!(session.current().is_none());
        assert!(session.grade(Grade::Hard).is_err());
    }

    #[test]
    fn test_empty_sessions_are_finished() {
        assert!(McqSession::new(Vec::new(), Language::En).is_finished());
        assert!(FlashcardSession::new(vec![card("1", SrsBucket::Scheduled)], Language::En)
            .is_finished());
    }

    #[test]
    fn test_flashcard_flow() {
        let mut session = FlashcardSession::new(
            vec![card("1", SrsBucket::New), card("2", SrsBucket::Due)],
            Language::En,
        );

        assert!(session.grade(Grade::Good).is_err());
        assert!(session.grade_buttons().unwrap().is_empty());

        session.flip();
        let labels: Vec<_> = session
            .grade_buttons()
            .unwrap()
            .into_iter()
            .map(|b| b.interval)
            .collect();
        assert_eq!(labels, vec!["1.0h", "12.0h", "1.0d", "2.0d"]);

        let review = session.grade(Grade::Good).unwrap();
        assert_eq!(review.kind, DeckKind::Flashcard);
        assert_eq!(session.known(), 1);
        assert!(!session.is_revealed());

        assert_eq!(session.remaining_stats().due_items, 1);
        assert_eq!(session.remaining_stats().new_items, 0);

        session.flip();
        session.grade(Grade::Hard).unwrap();
        assert_eq!(session.known(), 1);
        assert!(session.is_finished());
        assert_eq!(session.remaining_stats().studyable(), 0);

        session.restart();
        assert_eq!(session.remaining_stats().studyable(), 2);
        assert_eq!(session.index(), 0);
        assert_eq!(session.known(), 0);
        assert!(!session.is_finished());
    }
}
