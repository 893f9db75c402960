//! Main application state and logic.

use std::time::Instant;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::{error, info};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::theme::Theme;
use super::widgets::{
    CompletionScreen, FlashcardWidget, GradeButtons, KeyHints, Logo, Progress, QuestionWidget,
    StatsBar,
};
use crate::config::Config;
use crate::models::{DeckItems, DeckKind, DeckStats, Grade, Language, PendingReview, ScoreRecord};
use crate::session::{FlashcardSession, GradeButton, McqSession};
use crate::storage::{DeckInfo, DeckStorage};

// ══════════════════════════════════════════════════════════════════════════
// Application State
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    DeckSelect,
    Study,
    Complete,
}

/// The session being studied.
pub enum Study {
    Mcq(McqSession),
    Flashcard(FlashcardSession),
}

impl Study {
    fn is_finished(&self) -> bool {
        match self {
            Study::Mcq(s) => s.is_finished(),
            Study::Flashcard(s) => s.is_finished(),
        }
    }

    fn remaining_stats(&self) -> DeckStats {
        match self {
            Study::Mcq(s) => s.remaining_stats(),
            Study::Flashcard(s) => s.remaining_stats(),
        }
    }

    fn grade_buttons(&self) -> crate::Result<Vec<GradeButton>> {
        match self {
            Study::Mcq(s) => s.grade_buttons(),
            Study::Flashcard(s) => s.grade_buttons(),
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub running: bool,

    // Config and theme
    pub config: Config,
    pub theme: Theme,

    // Storage
    pub storage: DeckStorage,

    // Deck selection
    pub deck_list: Vec<DeckInfo>,
    pub deck_list_state: ListState,

    // Current deck
    pub deck_id: Option<String>,
    pub deck_title: String,
    pub deck_stats: DeckStats,

    // Study state
    pub study: Option<Study>,
    pub grade_buttons: Vec<GradeButton>,
    pub session_start: Option<Instant>,

    // Status message (shown temporarily)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(storage: DeckStorage, config: Config) -> Self {
        let deck_list = storage.list_decks().unwrap_or_default();
        let theme = Theme::from_name(&config.theme);

        Self {
            screen: Screen::DeckSelect,
            running: true,
            config,
            theme,
            storage,
            deck_list,
            deck_list_state: ListState::default().with_selected(Some(0)),
            deck_id: None,
            deck_title: String::new(),
            deck_stats: DeckStats::default(),
            study: None,
            grade_buttons: Vec::new(),
            session_start: None,
            status_message: None,
        }
    }

    pub fn cycle_theme(&mut self) {
        let new_theme_name = self.theme.name.next();
        self.theme = Theme::new(new_theme_name);
        self.config.theme = new_theme_name.as_str().to_string();
        self.persist_config();
    }

    pub fn toggle_language(&mut self) {
        self.config.language = match self.config.language {
            Language::En => Language::Ko,
            Language::Ko => Language::En,
        };
        // Applies from the next session on
        self.persist_config();
    }

    fn persist_config(&mut self) {
        if let Err(e) = self.config.save() {
            error!("Failed to save config: {e:#}");
            self.set_status(format!("Could not save settings: {}", e));
        }
    }

    pub fn refresh_deck_list(&mut self) {
        self.deck_list = self.storage.list_decks().unwrap_or_default();
        if self.deck_list.is_empty() {
            self.deck_list_state.select(None);
        } else if self
            .deck_list_state
            .selected()
            .map_or(true, |i| i >= self.deck_list.len())
        {
            self.deck_list_state.select(Some(0));
        }
    }

    pub fn select_deck(&mut self, deck_id: &str) {
        let deck = match self.storage.load_deck(deck_id) {
            Ok(deck) => deck,
            Err(e) => {
                error!("Failed to load deck '{}': {}", deck_id, e);
                self.set_status(format!("Could not open deck: {}", e));
                return;
            }
        };

        let language = self.config.language;
        self.deck_stats = deck.get_stats();
        self.deck_title = deck.title.clone();
        self.deck_id = Some(deck.id.clone());

        let study = match deck.items {
            DeckItems::Mcq(questions) => Study::Mcq(McqSession::new(questions, language)),
            DeckItems::Flashcards(cards) => {
                Study::Flashcard(FlashcardSession::new(cards, language))
            }
        };

        if study.is_finished() {
            self.set_status(format!("Nothing to study in '{}'", self.deck_title));
            self.deck_id = None;
            return;
        }

        info!("Starting session for '{}'", self.deck_title);
        self.study = Some(study);
        self.session_start = Some(Instant::now());
        self.screen = Screen::Study;
        self.refresh_grade_buttons();
    }

    fn refresh_grade_buttons(&mut self) {
        let buttons = self.study.as_ref().map(Study::grade_buttons);
        match buttons {
            Some(Ok(buttons)) => self.grade_buttons = buttons,
            Some(Err(e)) => {
                // Bad scheduling data from the backend: grade without a preview
                error!("Interval preview failed: {}", e);
                self.grade_buttons.clear();
                self.set_status(format!("Preview unavailable: {}", e));
            }
            None => self.grade_buttons.clear(),
        }
    }

    /// Stats bar counts follow the session; the total stays the deck's.
    fn refresh_stats(&mut self) {
        if let Some(study) = &self.study {
            self.deck_stats = DeckStats {
                total_items: self.deck_stats.total_items,
                ..study.remaining_stats()
            };
        }
    }

    /// Queue a grade update; failures are logged and shown, never fatal.
    fn queue_review(&mut self, review: PendingReview) {
        let Some(deck_id) = self.deck_id.clone() else {
            return;
        };
        if let Err(e) = self.storage.queue_reviews(&deck_id, &[review]) {
            error!("Failed to queue review for '{}': {}", deck_id, e);
            self.set_status(format!("Could not save grade: {}", e));
        }
    }

    fn finish_session(&mut self) {
        if let (Some(Study::Mcq(session)), Some(deck_id)) = (&self.study, &self.deck_id) {
            let record = ScoreRecord {
                set_id: deck_id.clone(),
                score: session.score(),
                queued_at: Local::now(),
            };
            if let Err(e) = self.storage.queue_score(record) {
                error!("Failed to queue score: {}", e);
            }
        }
        info!("Session finished for '{}'", self.deck_title);
        self.screen = Screen::Complete;
    }

    pub fn grade(&mut self, grade: Grade) {
        let result = match self.study.as_mut() {
            Some(Study::Mcq(s)) => s.grade(grade),
            Some(Study::Flashcard(s)) => s.grade(grade),
            None => return,
        };

        match result {
            Ok(review) => self.queue_review(review),
            // Not offered right now (unrevealed, or wrong half for an MCQ)
            Err(_) => return,
        }

        self.refresh_stats();
        if self.study.as_ref().map_or(false, Study::is_finished) {
            self.finish_session();
        }
        self.refresh_grade_buttons();
    }

    /// Flashcard decks can be run again; quizzes are scored once.
    pub fn restart(&mut self) {
        if let Some(Study::Flashcard(session)) = self.study.as_mut() {
            session.restart();
            self.refresh_stats();
            self.session_start = Some(Instant::now());
            self.screen = Screen::Study;
            self.refresh_grade_buttons();
        }
    }

    fn leave_study(&mut self) {
        self.screen = Screen::DeckSelect;
        self.study = None;
        self.deck_id = None;
        self.grade_buttons.clear();
        self.refresh_deck_list();
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    // ══════════════════════════════════════════════════════════════════════
    // Event Handling
    // ══════════════════════════════════════════════════════════════════════

    pub fn handle_events(&mut self) -> anyhow::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(());
                }
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match self.screen {
            Screen::DeckSelect => self.handle_deck_select_keys(key),
            Screen::Study => self.handle_study_keys(key),
            Screen::Complete => self.handle_complete_keys(key),
        }
    }

    fn handle_deck_select_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char('l') => self.toggle_language(),
            KeyCode::Char('r') => self.refresh_deck_list(),
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.deck_list_state.selected().unwrap_or(0);
                let new_i = if i == 0 {
                    self.deck_list.len().saturating_sub(1)
                } else {
                    i - 1
                };
                self.deck_list_state.select(Some(new_i));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.deck_list_state.selected().unwrap_or(0);
                let new_i = if i >= self.deck_list.len().saturating_sub(1) {
                    0
                } else {
                    i + 1
                };
                self.deck_list_state.select(Some(new_i));
            }
            KeyCode::Enter => {
                if let Some(i) = self.deck_list_state.selected() {
                    if let Some(deck_info) = self.deck_list.get(i) {
                        let deck_id = deck_info.id.clone();
                        self.select_deck(&deck_id);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_study_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.leave_study();
                return;
            }
            KeyCode::Char('t') => {
                self.cycle_theme();
                return;
            }
            _ => {}
        }

        match self.study.as_mut() {
            Some(Study::Mcq(session)) => {
                if session.is_revealed() {
                    if let KeyCode::Char(c) = key {
                        if let Some(grade) = Grade::from_key(c) {
                            self.grade(grade);
                        }
                    }
                    return;
                }
                match key {
                    KeyCode::Char(c @ '1'..='9') => {
                        let position = c as usize - '1' as usize;
                        session.select_index(position);
                    }
                    KeyCode::Enter => {
                        if session.submit().is_some() {
                            self.refresh_grade_buttons();
                        }
                    }
                    _ => {}
                }
            }
            Some(Study::Flashcard(session)) => match key {
                KeyCode::Char(' ') => {
                    session.flip();
                    self.refresh_grade_buttons();
                }
                KeyCode::Char(c) => {
                    if let Some(grade) = Grade::from_key(c) {
                        self.grade(grade);
                    }
                }
                _ => {}
            },
            None => {}
        }
    }

    fn handle_complete_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.leave_study(),
            KeyCode::Char('r') => self.restart(),
            _ => {}
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Rendering
    // ══════════════════════════════════════════════════════════════════════

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Clear with background
        frame.render_widget(Clear, area);
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.colors.background)),
            area,
        );

        match self.screen {
            Screen::DeckSelect => self.render_deck_select(frame, area),
            Screen::Study => self.render_study(frame, area),
            Screen::Complete => self.render_complete(frame, area),
        }
    }

    fn render_deck_select(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(2),   // Top padding
            Constraint::Length(6),   // Logo
            Constraint::Length(2),   // Spacing
            Constraint::Min(5),      // Deck list
            Constraint::Length(3),   // Help
        ])
        .split(area);

        frame.render_widget(Logo::new(&self.theme), chunks[1]);

        let list_area = centered_rect(60, 100, chunks[3]);
        let title_width = (list_area.width as usize).saturating_sub(28);

        let items: Vec<ListItem> = self
            .deck_list
            .iter()
            .map(|deck| {
                let kind = match deck.kind {
                    DeckKind::Mcq => "MCQ ",
                    DeckKind::Flashcard => "CARD",
                };
                let content = Line::from(vec![
                    Span::styled(
                        format!("[{}] ", kind),
                        Style::default().fg(self.theme.colors.accent),
                    ),
                    Span::styled(
                        deck.short_title(title_width),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(
                            " ({} {}, {} to study)",
                            deck.item_count,
                            deck.kind.item_noun(),
                            deck.stats.studyable()
                        ),
                        Style::default().fg(self.theme.colors.text_muted),
                    ),
                ]);
                ListItem::new(content)
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.theme.colors.primary))
                    .title(" Decks ")
                    .title_style(self.theme.highlight()),
            )
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, list_area, &mut self.deck_list_state);

        if self.deck_list.is_empty() {
            let empty = Paragraph::new(format!(
                "No decks in {}",
                self.storage.decks_dir().display()
            ))
            .alignment(Alignment::Center)
            .style(Style::default().fg(self.theme.colors.text_muted));
            frame.render_widget(empty, centered_rect(60, 30, chunks[3]));
        }

        let theme_hint = format!("[{}]", self.theme.name.display_name());
        let language_hint = match self.config.language {
            Language::En => "[EN]",
            Language::Ko => "[KO]",
        };
        let hints_data: [(&str, &str); 6] = [
            ("j/k", "nav"),
            ("Enter", "study"),
            ("r", "reload"),
            ("l", language_hint),
            ("t", theme_hint.as_str()),
            ("q", "quit"),
        ];
        frame.render_widget(KeyHints::new(&hints_data, &self.theme), chunks[4]);

        self.render_status(frame, chunks[4]);
    }

    /// Status message for 5 seconds, just above `anchor`.
    fn render_status(&self, frame: &mut Frame, anchor: Rect) {
        if let Some((ref msg, time)) = self.status_message {
            if time.elapsed().as_secs() < 5 {
                let status = Paragraph::new(msg.as_str())
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(self.theme.colors.warning));
                let status_area = Rect {
                    x: anchor.x,
                    y: anchor.y.saturating_sub(1),
                    width: anchor.width,
                    height: 1,
                };
                frame.render_widget(status, status_area);
            }
        }
    }

    fn render_study(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3),   // Header
            Constraint::Length(1),   // Stats
            Constraint::Length(1),   // Progress
            Constraint::Length(1),   // Separator
            Constraint::Min(10),     // Item
            Constraint::Length(1),   // Separator
            Constraint::Length(5),   // Buttons
            Constraint::Length(2),   // Hints
        ])
        .split(area);

        let header = Paragraph::new(Line::styled(self.deck_title.as_str(), self.theme.title()))
            .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);
        frame.render_widget(StatsBar::new(self.deck_stats, &self.theme), chunks[1]);

        let item_area = centered_rect(80, 100, chunks[4]);
        let buttons_area = centered_rect(90, 100, chunks[6]);

        let hints: &[(&str, &str)] = match &self.study {
            Some(Study::Mcq(session)) => {
                frame.render_widget(
                    Progress::new(session.index(), session.total(), session.progress_pct(), &self.theme),
                    centered_rect(80, 100, chunks[2]),
                );
                if let Some(q) = session.current() {
                    frame.render_widget(
                        QuestionWidget::new(
                            q,
                            session.index() + 1,
                            session.selected(),
                            session.is_revealed(),
                            &self.theme,
                        ),
                        item_area,
                    );
                }
                if session.is_revealed() {
                    &[("1-4", "grade"), ("Esc", "quit")]
                } else {
                    &[("1-4", "choose"), ("Enter", "submit"), ("Esc", "quit")]
                }
            }
            Some(Study::Flashcard(session)) => {
                frame.render_widget(
                    Progress::new(session.index(), session.total(), session.progress_pct(), &self.theme),
                    centered_rect(80, 100, chunks[2]),
                );
                if let Some(card) = session.current() {
                    let (content, is_front) = if session.is_revealed() {
                        (card.back.as_str(), false)
                    } else {
                        (card.front.as_str(), true)
                    };
                    frame.render_widget(FlashcardWidget::new(content, is_front, &self.theme), item_area);
                }
                if session.is_revealed() {
                    &[("1-4", "grade"), ("Space", "flip"), ("Esc", "quit")]
                } else {
                    &[("Space", "show answer"), ("Esc", "quit")]
                }
            }
            None => &[("Esc", "quit")],
        };

        frame.render_widget(GradeButtons::new(&self.grade_buttons, &self.theme), buttons_area);
        frame.render_widget(KeyHints::new(hints, &self.theme), chunks[7]);
        self.render_status(frame, chunks[7]);
    }

    fn render_complete(&mut self, frame: &mut Frame, area: Rect) {
        let card_area = centered_rect(50, 40, area);

        let duration_mins = self
            .session_start
            .map(|s| s.elapsed().as_secs() / 60)
            .unwrap_or(0);

        let (heading, correct, total, can_restart) = match &self.study {
            Some(Study::Mcq(s)) => ("QUIZ COMPLETE", s.score(), s.total(), false),
            Some(Study::Flashcard(s)) => ("DECK COMPLETE", s.known(), s.total(), true),
            None => ("SESSION COMPLETE", 0, 0, false),
        };

        frame.render_widget(
            CompletionScreen::new(heading, correct, total, duration_mins, &self.theme)
                .restartable(can_restart),
            card_area,
        );
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Helper Functions
// ══════════════════════════════════════════════════════════════════════════

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZ: &str = r#"{"title": "Quiz", "mcqs": [
        {"id": "q1", "question": "2 + 2?", "options": [
            {"id": "A", "option": "3"}, {"id": "B", "option": "4", "correct": true}],
         "interval_hours": 0, "ef": 2.5, "repetitions": 0, "srsType": "newC"}
    ]}"#;

    fn app_with(deck: &str) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let storage = DeckStorage::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("quiz.json"), deck).unwrap();
        (dir, App::new(storage, Config::default()))
    }

    #[test]
    fn test_quiz_round_trip_through_keys() {
        let (_dir, mut app) = app_with(QUIZ);
        assert_eq!(app.deck_list.len(), 1);

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::Study);
        assert!(app.grade_buttons.is_empty());
        assert_eq!(app.deck_stats.new_items, 1);

        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Enter);
        let intervals: Vec<_> = app.grade_buttons.iter().map(|b| b.interval.as_str()).collect();
        assert_eq!(intervals, vec!["1.0d", "2.0d"]);

        // Again is not offered after a correct answer
        app.handle_key(KeyCode::Char('1'));
        assert_eq!(app.screen, Screen::Study);

        app.handle_key(KeyCode::Char('4'));
        assert_eq!(app.screen, Screen::Complete);
        assert_eq!(app.deck_stats.new_items, 0);
        assert_eq!(app.deck_stats.total_items, 1);

        let outbox = app.storage.pending("quiz").unwrap();
        assert_eq!(outbox.reviews.len(), 1);
        assert_eq!(outbox.reviews[0].submission.grade, Grade::Easy);
        assert_eq!(outbox.scores[0].score, 1);

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.study.is_none());
    }

    #[test]
    fn test_deck_with_nothing_due_stays_on_list() {
        let (_dir, mut app) = app_with(r#"[{"front": "a", "back": "b", "srsType": "scheduled"}]"#);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::DeckSelect);
        assert!(app.status_message.is_some());
    }
}
