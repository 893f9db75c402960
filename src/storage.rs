//! Storage module for study decks and the review outbox.
//!
//! Decks are backend payloads saved as `<id>.json` in the decks directory.
//! Grades and scores are queued in `outbox/<id>.json` until a sync step
//! delivers them to the backend.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::error::{Error, Result};
use crate::models::{Deck, DeckKind, DeckStats, PendingReview, ScoreRecord};

/// Handles deck loading and outbox persistence.
pub struct DeckStorage {
    decks_dir: PathBuf,
}

/// Everything queued for one deck.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outbox {
    #[serde(default)]
    pub reviews: Vec<PendingReview>,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
}

impl DeckStorage {
    pub fn new(decks_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&decks_dir).map_err(|e| Error::io(&decks_dir, e))?;
        Ok(Self { decks_dir })
    }

    /// Get default storage location.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recallify")
            .join("decks")
    }

    pub fn decks_dir(&self) -> &Path {
        &self.decks_dir
    }

    fn deck_path(&self, deck_id: &str) -> PathBuf {
        self.decks_dir.join(format!("{}.json", deck_id))
    }

    fn outbox_path(&self, deck_id: &str) -> PathBuf {
        self.decks_dir.join("outbox").join(format!("{}.json", deck_id))
    }

    /// Load a deck from disk.
    pub fn load_deck(&self, deck_id: &str) -> Result<Deck> {
        let path = self.deck_path(deck_id);
        if !path.exists() {
            return Err(Error::DeckNotFound(deck_id.to_string()));
        }

        let json = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let deck = Deck::from_json(deck_id, &json)?.ok_or(Error::UnknownDeckFormat(path))?;
        debug!("Loaded deck '{}' with {} items", deck.id, deck.len());
        Ok(deck)
    }

    /// List all available decks.
    pub fn list_decks(&self) -> Result<Vec<DeckInfo>> {
        let mut decks = Vec::new();

        let entries = fs::read_dir(&self.decks_dir).map_err(|e| Error::io(&self.decks_dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&self.decks_dir, e))?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.load_deck(id) {
                Ok(deck) => decks.push(DeckInfo {
                    id: deck.id.clone(),
                    title: deck.title.clone(),
                    kind: deck.kind(),
                    item_count: deck.len(),
                    stats: deck.get_stats(),
                }),
                Err(e) => warn!("Skipping {:?}: {}", path, e),
            }
        }

        decks.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(decks)
    }

    /// Read everything queued for a deck.
    pub fn pending(&self, deck_id: &str) -> Result<Outbox> {
        let path = self.outbox_path(deck_id);
        if !path.exists() {
            return Ok(Outbox::default());
        }
        let json = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_outbox(&self, deck_id: &str, outbox: &Outbox) -> Result<()> {
        let path = self.outbox_path(deck_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(outbox)?;
        fs::write(&path, json).map_err(|e| Error::io(&path, e))
    }

    /// Append grade updates to a deck's outbox.
    pub fn queue_reviews(&self, deck_id: &str, reviews: &[PendingReview]) -> Result<()> {
        if reviews.is_empty() {
            return Ok(());
        }
        let mut outbox = self.pending(deck_id)?;
        outbox.reviews.extend_from_slice(reviews);
        self.write_outbox(deck_id, &outbox)?;
        debug!("Queued {} reviews for '{}'", reviews.len(), deck_id);
        Ok(())
    }

    /// Append a final score to a deck's outbox.
    pub fn queue_score(&self, score: ScoreRecord) -> Result<()> {
        let deck_id = score.set_id.clone();
        let mut outbox = self.pending(&deck_id)?;
        outbox.scores.push(score);
        self.write_outbox(&deck_id, &outbox)
    }
}

/// Summary info for a deck.
#[derive(Debug, Clone)]
pub struct DeckInfo {
    pub id: String,
    pub title: String,
    pub kind: DeckKind,
    pub item_count: usize,
    pub stats: DeckStats,
}

impl DeckInfo {
    /// Title cut to a display width, for wide (e.g. Hangul) titles.
    pub fn short_title(&self, max_width: usize) -> String {
        truncate_to_width(&self.title, max_width)
    }
}

/// Truncate to at most `max_width` terminal columns, marking cuts with `…`.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}
