//! Custom widgets for the study TUI.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use super::theme::{icons, Theme};
use crate::models::{DeckStats, Question};
use crate::session::GradeButton;

// ══════════════════════════════════════════════════════════════════════════
// Logo Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct Logo<'a> {
    theme: &'a Theme,
}

impl<'a> Logo<'a> {
    const ART: &'static str = r#"
 ____                 _ _ _  __
|  _ \ ___  ___ __ _| | (_)/ _|_   _
| |_) / _ \/ __/ _` | | | | |_| | | |
|  _ <  __/ (_| (_| | | | |  _| |_| |
|_| \_\___|\___\__,_|_|_|_|_|  \__, |
                               |___/"#;

    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for Logo<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = Self::ART
            .lines()
            .skip(1)
            .map(|line| Line::styled(line, Style::default().fg(self.theme.colors.primary)))
            .collect();

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Stats Bar Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct StatsBar<'a> {
    stats: DeckStats,
    theme: &'a Theme,
}

impl<'a> StatsBar<'a> {
    pub fn new(stats: DeckStats, theme: &'a Theme) -> Self {
        Self { stats, theme }
    }
}

impl Widget for StatsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
        let muted = Style::default().fg(self.theme.colors.text_muted);

        let cells = [
            ("New: ", self.stats.new_items, self.theme.stats_new()),
            ("Learning: ", self.stats.learning_items, self.theme.stats_learning()),
            ("Due: ", self.stats.due_items, self.theme.stats_due()),
        ];
        for (chunk, (label, count, style)) in chunks.iter().zip(cells) {
            Paragraph::new(Line::from(vec![
                Span::styled("● ", style),
                Span::styled(label, muted),
                Span::styled(count.to_string(), style),
            ]))
            .alignment(Alignment::Center)
            .render(*chunk, buf);
        }

        Paragraph::new(Line::from(vec![
            Span::styled("Total: ", muted),
            Span::styled(
                self.stats.total_items.to_string(),
                Style::default().fg(self.theme.colors.text_dim),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Progress Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct Progress<'a> {
    index: usize,
    total: usize,
    percent: u16,
    theme: &'a Theme,
}

impl<'a> Progress<'a> {
    pub fn new(index: usize, total: usize, percent: u16, theme: &'a Theme) -> Self {
        Self { index, total, percent, theme }
    }
}

impl Widget for Progress<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(self.theme.colors.primary)
                    .bg(self.theme.colors.bg_highlight),
            )
            .percent(self.percent.min(100))
            .label(format!("{} / {}", self.index, self.total))
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Flashcard Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct FlashcardWidget<'a> {
    content: &'a str,
    is_front: bool,
    theme: &'a Theme,
}

impl<'a> FlashcardWidget<'a> {
    pub fn new(content: &'a str, is_front: bool, theme: &'a Theme) -> Self {
        Self { content, is_front, theme }
    }
}

impl Widget for FlashcardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (label, label_style, border_style) = if self.is_front {
            ("FRONT", self.theme.card_front(), Style::default().fg(self.theme.colors.accent))
        } else {
            ("BACK", self.theme.card_back(), Style::default().fg(self.theme.colors.success))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(label, label_style),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        // Center vertically
        let content_height = self.content.lines().count() as u16;
        let vertical_padding = inner.height.saturating_sub(content_height) / 2;

        let content_area = Rect {
            x: inner.x + 2,
            y: inner.y + vertical_padding,
            width: inner.width.saturating_sub(4),
            height: inner.height.saturating_sub(vertical_padding),
        };

        Paragraph::new(self.content)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(self.theme.colors.text))
            .render(content_area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Question Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct QuestionWidget<'a> {
    question: &'a Question,
    number: usize,
    selected: Option<&'a str>,
    revealed: bool,
    theme: &'a Theme,
}

impl<'a> QuestionWidget<'a> {
    pub fn new(
        question: &'a Question,
        number: usize,
        selected: Option<&'a str>,
        revealed: bool,
        theme: &'a Theme,
    ) -> Self {
        Self { question, number, selected, revealed, theme }
    }

    fn option_style(&self, id: &str) -> Style {
        let is_selected = self.selected == Some(id);
        if !self.revealed {
            return if is_selected {
                self.theme.selected().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.colors.text)
            };
        }
        if self.question.is_correct(id) {
            self.theme.option_correct()
        } else if is_selected {
            self.theme.option_wrong()
        } else {
            Style::default().fg(self.theme.colors.text_dim)
        }
    }

    fn explanation_lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        if !self.revealed {
            return lines;
        }

        if let Some(correct) = self.question.correct_option() {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", icons::CHECK), self.theme.option_correct()),
                Span::styled(format!("{}. {}", correct.id, correct.option), self.theme.option_correct()),
            ]));
            lines.push(Line::styled(
                self.question.correct_explanation(),
                Style::default().fg(self.theme.colors.text_muted),
            ));
        }

        if let Some(picked) = self
            .selected
            .filter(|id| !self.question.is_correct(id))
            .and_then(|id| self.question.option(id))
        {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", icons::CROSS), self.theme.option_wrong()),
                Span::styled(format!("{}. {}", picked.id, picked.option), self.theme.option_wrong()),
            ]));
            lines.push(Line::styled(
                picked
                    .explanation
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .unwrap_or("This option is incorrect."),
                Style::default().fg(self.theme.colors.text_muted),
            ));
        }

        lines
    }
}

impl Widget for QuestionWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.primary))
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(format!("Q{}", self.number), self.theme.highlight()),
                Span::raw(" "),
            ]));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::styled(self.question.question.as_str(), self.theme.title()),
            Line::from(""),
        ];
        for (i, option) in self.question.options.iter().enumerate() {
            let style = self.option_style(&option.id);
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), self.theme.key_highlight()),
                Span::styled(format!("{}. {}", option.id, option.option), style),
            ]));
        }
        lines.extend(self.explanation_lines());

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(
                Rect {
                    x: inner.x + 1,
                    width: inner.width.saturating_sub(2),
                    ..inner
                },
                buf,
            );
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Grade Buttons Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct GradeButtons<'a> {
    buttons: &'a [GradeButton],
    theme: &'a Theme,
}

impl<'a> GradeButtons<'a> {
    pub fn new(buttons: &'a [GradeButton], theme: &'a Theme) -> Self {
        Self { buttons, theme }
    }
}

impl Widget for GradeButtons<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.buttons.is_empty() {
            return;
        }

        let count = self.buttons.len() as u32;
        let chunks = Layout::horizontal(vec![Constraint::Ratio(1, count); self.buttons.len()])
            .split(area);

        for (chunk, button) in chunks.iter().zip(self.buttons) {
            let color = self.theme.grade_color(button.grade);

            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color));

            let inner = block.inner(*chunk);
            block.render(*chunk, buf);

            let lines = vec![
                Line::styled(
                    button.grade.value().to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Line::styled(button.label, Style::default().fg(color)),
                Line::styled(
                    format!("({})", button.interval),
                    Style::default().fg(self.theme.colors.text_muted),
                ),
            ];
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .render(inner, buf);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Key Hints Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct KeyHints<'a> {
    hints: &'a [(&'a str, &'a str)],
    theme: &'a Theme,
}

impl<'a> KeyHints<'a> {
    pub fn new(hints: &'a [(&'a str, &'a str)], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }
}

impl Widget for KeyHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .hints
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(*key, self.theme.key_highlight()),
                    Span::styled(format!(" {} ", desc), self.theme.key_hint()),
                    Span::styled("│ ", Style::default().fg(self.theme.colors.text_dim)),
                ]
            })
            .collect();

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Completion Screen Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct CompletionScreen<'a> {
    heading: &'a str,
    correct: usize,
    total: usize,
    duration_mins: u64,
    restartable: bool,
    theme: &'a Theme,
}

impl<'a> CompletionScreen<'a> {
    pub fn new(
        heading: &'a str,
        correct: usize,
        total: usize,
        duration_mins: u64,
        theme: &'a Theme,
    ) -> Self {
        Self {
            heading,
            correct,
            total,
            duration_mins,
            restartable: false,
            theme,
        }
    }

    pub fn restartable(mut self, restartable: bool) -> Self {
        self.restartable = restartable;
        self
    }
}

/// Whole-number percentage, 0 for an empty session.
pub fn score_percent(correct: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u64
}

impl Widget for CompletionScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.success))
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(self.heading, self.theme.card_back()),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let muted = Style::default().fg(self.theme.colors.text_muted);
        let value = Style::default()
            .fg(self.theme.colors.primary)
            .add_modifier(Modifier::BOLD);

        let dim = Style::default().fg(self.theme.colors.text_dim);
        let mut keys = Vec::new();
        if self.restartable {
            keys.push(Span::styled("r", self.theme.key_highlight()));
            keys.push(Span::styled(" restart  ", dim));
        }
        keys.push(Span::styled("Esc", self.theme.key_highlight()));
        keys.push(Span::styled(" back to decks", dim));

        let text = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("Score: ", muted),
                Span::styled(format!("{} / {}", self.correct, self.total), value),
            ]),
            Line::styled(
                format!("{}% correct", score_percent(self.correct, self.total)),
                muted,
            ),
            Line::from(vec![
                Span::styled("Time: ", muted),
                Span::styled(format!("{} minutes", self.duration_mins), value),
            ]),
            Line::from(""),
            Line::from(keys),
        ];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
