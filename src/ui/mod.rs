// UI module for the statistics dashboard.
// Lays out the tab bar, the chart for the active tab, and the status bar.

mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};
use crate::error::Result;
use crate::report::RepoReport;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);
    draw_content(frame, app, chunks[1]);
    draw_status_bar(frame, chunks[2]);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_content(frame: &mut Frame, app: &App, area: Rect) {
    let Some(report) = app.current() else {
        draw_message(frame, area, "No repositories analyzed", Color::DarkGray);
        return;
    };

    match app.active_tab {
        Tab::Authors => frame.render_widget(report.author_chart().widget(), area),
        Tab::Activity => draw_series(frame, area, report.authors_chart()),
        Tab::Issues => draw_issues_tab(frame, report, area),
        Tab::Citations if report.citations.is_empty() => draw_message(
            frame,
            area,
            "No bibcodes listed for this repository",
            Color::DarkGray,
        ),
        Tab::Citations => frame.render_widget(report.citations_chart().widget(), area),
        Tab::Summary => {
            let summary = Paragraph::new(report.summary(&app.template))
                .block(Block::default().borders(Borders::ALL).title(" Summary "))
                .wrap(Wrap { trim: false });
            frame.render_widget(summary, area);
        }
    }
}

fn draw_issues_tab(frame: &mut Frame, report: &RepoReport, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    draw_series(frame, chunks[0], report.issues_chart());
    frame.render_widget(report.open_items_chart().widget(), chunks[1]);
}

fn draw_series(frame: &mut Frame, area: Rect, chart: Result<crate::report::SeriesChart>) {
    match chart {
        Ok(chart) => frame.render_widget(chart.widget(), area),
        Err(e) => draw_message(frame, area, &format!("❌ {}", e), Color::Red),
    }
}

fn draw_message(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let text = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(text, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect) {
    let hints = vec![
        Span::raw(" ←→ "),
        Span::styled("Repository", Style::default().fg(Color::DarkGray)),
        Span::raw("  Tab "),
        Span::styled("Switch", Style::default().fg(Color::DarkGray)),
        Span::raw("  ? "),
        Span::styled("Help", Style::default().fg(Color::DarkGray)),
        Span::raw("  q "),
        Span::styled("Quit", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 45;
    let popup_height = 11;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    frame.render_widget(Clear, popup_area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(k, Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        key("  ←/→ or h/l    ", "Previous / next repository"),
        key("  Tab/Shift-Tab ", "Switch tabs"),
        key("  ?             ", "Show/hide this help"),
        key("  q or Esc      ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
    );

    frame.render_widget(help_paragraph, popup_area);
}
