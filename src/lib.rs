//! Recallify study client.
//!
//! Loads MCQ and flashcard sets exported from the Recallify backend, runs
//! study sessions in the terminal and queues grade updates for the backend.
//! The [`schedule`] module holds the interval preview shown on every grade
//! button.

pub mod config;
pub mod error;
pub mod models;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod ui;

pub use error::{Error, Result};
pub use models::{Deck, Flashcard, Grade, Question, ReviewState};
pub use session::{FlashcardSession, McqSession};
