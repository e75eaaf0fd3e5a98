// Dashboard state and main event loop.
// Holds the analyzed repositories, the active tab, and keyboard input handling.

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;

use crate::report::RepoReport;
use crate::ui;

/// Active tab in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Authors,
    Activity,
    Issues,
    Citations,
    Summary,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Authors,
        Tab::Activity,
        Tab::Issues,
        Tab::Citations,
        Tab::Summary,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Authors => "Authors",
            Tab::Activity => "Activity",
            Tab::Issues => "Issues & PRs",
            Tab::Citations => "Citations",
            Tab::Summary => "Summary",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Authors => Tab::Activity,
            Tab::Activity => Tab::Issues,
            Tab::Issues => Tab::Citations,
            Tab::Citations => Tab::Summary,
            Tab::Summary => Tab::Authors,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Authors => Tab::Summary,
            Tab::Activity => Tab::Authors,
            Tab::Issues => Tab::Activity,
            Tab::Citations => Tab::Issues,
            Tab::Summary => Tab::Citations,
        }
    }
}

/// Dashboard state.
pub struct App {
    pub reports: Vec<RepoReport>,
    /// Summary template shown on the Summary tab.
    pub template: String,
    /// Index into `reports`.
    pub selected: usize,
    pub active_tab: Tab,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(reports: Vec<RepoReport>, template: String) -> Self {
        Self {
            reports,
            template,
            selected: 0,
            active_tab: Tab::default(),
            show_help: false,
            should_quit: false,
        }
    }

    /// Repository currently on screen.
    pub fn current(&self) -> Option<&RepoReport> {
        self.reports.get(self.selected)
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    #[allow(clippy::collapsible_if)]
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, code: KeyCode) {
        if self.show_help {
            if matches!(code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.active_tab = self.active_tab.next(),
            KeyCode::BackTab => self.active_tab = self.active_tab.prev(),
            KeyCode::Right | KeyCode::Char('l') => self.select_next(),
            KeyCode::Left | KeyCode::Char('h') => self.select_prev(),
            _ => {}
        }
    }

    fn select_next(&mut self) {
        if !self.reports.is_empty() {
            self.selected = (self.selected + 1) % self.reports.len();
        }
    }

    fn select_prev(&mut self) {
        if !self.reports.is_empty() {
            self.selected = (self.selected + self.reports.len() - 1) % self.reports.len();
        }
    }
}
