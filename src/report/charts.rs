// Chart construction and off-screen rendering.
// Builds ratatui chart widgets from statistics; the same widgets back the
// dashboard and the text files written next to each cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Chart, Dataset, GraphType, LegendPosition, Widget,
    },
};

use crate::error::Result;
use crate::stats::{
    ALL_CITATIONS, CitationSeries, CommitStats, IssuePrStats, MonthCount, YearMonth,
    rolling_average,
};

/// Line colors, in plotting order.
pub const PALETTE: [Color; 5] = [
    Color::Rgb(0xff, 0x83, 0x00),
    Color::Rgb(0x23, 0xd3, 0x61),
    Color::Rgb(0xbf, 0x17, 0x7a),
    Color::Rgb(0x20, 0xc8, 0xed),
    Color::Rgb(0x2c, 0x3e, 0x50),
];

/// One plotted line.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub color: Color,
    /// Raw monthly values are drawn as dots, averages as lines.
    pub smoothed: bool,
    pub points: Vec<(f64, f64)>,
}

/// What the x coordinate of a line chart counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    /// Months since the first plotted month.
    Months,
    /// Calendar years.
    Years,
}

/// A line chart with its data.
#[derive(Debug, Clone)]
pub struct SeriesChart {
    pub title: String,
    pub x_axis: XAxis,
    pub first_month: Option<YearMonth>,
    pub last_month: Option<YearMonth>,
    pub series: Vec<Series>,
}

impl SeriesChart {
    fn new(title: String) -> Self {
        Self {
            title,
            x_axis: XAxis::Months,
            first_month: None,
            last_month: None,
            series: Vec::new(),
        }
    }

    /// Add a monthly series and, optionally, its rolling average.
    fn push_monthly(
        &mut self,
        base: YearMonth,
        name: &str,
        color: Color,
        data: &[MonthCount],
        window: Option<usize>,
    ) -> Result<()> {
        let points: Vec<(f64, f64)> = data
            .iter()
            .map(|c| (month_offset(base, c.month), c.count as f64))
            .collect();

        if let Some(window) = window {
            let values: Vec<f64> = data.iter().map(|c| c.count as f64).collect();
            let avg = rolling_average(&values, window)?;
            let smoothed = avg
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (points[i + avg.edge()].0, *v))
                .collect();
            self.series.push(Series {
                name: format!("{}: {} month rolling average", name, avg.window),
                color,
                smoothed: true,
                points: smoothed,
            });
        }

        self.series.push(Series {
            name: name.to_string(),
            color,
            smoothed: false,
            points,
        });

        if let (Some(first), Some(last)) = (data.first(), data.last()) {
            self.first_month = Some(self.first_month.map_or(first.month, |m| m.min(first.month)));
            self.last_month = Some(self.last_month.map_or(last.month, |m| m.max(last.month)));
        }
        Ok(())
    }

    fn x_bounds(&self) -> [f64; 2] {
        let xs = || self.series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
        match self.x_axis {
            XAxis::Months => [0.0, xs().fold(0.0, f64::max).max(1.0)],
            XAxis::Years => {
                let min = xs().fold(f64::INFINITY, f64::min);
                let max = xs().fold(f64::NEG_INFINITY, f64::max);
                if min.is_finite() {
                    [min, max.max(min + 1.0)]
                } else {
                    [0.0, 1.0]
                }
            }
        }
    }

    fn y_bounds(&self) -> [f64; 2] {
        let max = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.1))
            .fold(0.0, f64::max);
        [0.0, (max * 1.1).max(1.0)]
    }

    fn x_labels(&self) -> Vec<String> {
        if self.x_axis == XAxis::Years {
            if self.series.iter().all(|s| s.points.is_empty()) {
                return Vec::new();
            }
            let [first, last] = self.x_bounds();
            return vec![format!("{:.0}", first), format!("{:.0}", last)];
        }
        match (self.first_month, self.last_month) {
            (Some(first), Some(last)) if first != last => {
                vec![first.to_string(), last.to_string()]
            }
            (Some(first), _) => vec![first.to_string()],
            _ => Vec::new(),
        }
    }

    /// Chart widget borrowing this chart's data.
    pub fn widget(&self) -> Chart<'_> {
        let datasets = self
            .series
            .iter()
            .map(|s| {
                let dataset = Dataset::default()
                    .name(s.name.clone())
                    .data(&s.points)
                    .style(Style::default().fg(s.color));
                if s.smoothed {
                    dataset.marker(Marker::Braille).graph_type(GraphType::Line)
                } else {
                    dataset.marker(Marker::Dot).graph_type(GraphType::Scatter)
                }
            })
            .collect();

        let [_, y_max] = self.y_bounds();
        Chart::new(datasets)
            .block(Block::bordered().title(self.title.clone()))
            .x_axis(
                Axis::default()
                    .title(match self.x_axis {
                        XAxis::Months => "Date",
                        XAxis::Years => "Year",
                    })
                    .bounds(self.x_bounds())
                    .labels(self.x_labels()),
            )
            .y_axis(
                Axis::default()
                    .title("N")
                    .bounds([0.0, y_max])
                    .labels(vec!["0".to_string(), format!("{:.0}", y_max)]),
            )
            .legend_position(Some(LegendPosition::TopLeft))
            .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)))
    }
}

/// A titled set of labelled bar groups.
#[derive(Debug, Clone)]
pub struct BarData {
    pub title: String,
    pub direction: Direction,
    /// (group label, bars as (label, value, color)).
    pub groups: Vec<(String, Vec<(String, u64, Color)>)>,
}

impl BarData {
    /// Rows (horizontal) or columns (vertical) the bars need.
    pub fn bar_count(&self) -> usize {
        self.groups.iter().map(|(_, bars)| bars.len()).sum()
    }

    /// Bar chart widget.
    pub fn widget(&self) -> BarChart<'_> {
        let max = self
            .groups
            .iter()
            .flat_map(|(_, bars)| bars.iter().map(|b| b.1))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut chart = BarChart::default()
            .block(Block::bordered().title(self.title.clone()))
            .direction(self.direction)
            .bar_width(if self.direction == Direction::Horizontal { 1 } else { 3 })
            .bar_gap(if self.direction == Direction::Horizontal { 0 } else { 1 })
            .group_gap(1)
            .max(max);

        for (label, bars) in &self.groups {
            let bars: Vec<Bar> = bars
                .iter()
                .map(|(name, value, color)| {
                    Bar::default()
                        .value(*value)
                        .label(Line::from(name.clone()))
                        .text_value(value.to_string())
                        .style(Style::default().fg(*color))
                })
                .collect();
            let mut group = BarGroup::default().bars(&bars);
            if !label.is_empty() {
                group = group.label(Line::from(label.clone()));
            }
            chart = chart.data(group);
        }
        chart
    }
}

/// Months from `base` to `month`, as a plot coordinate.
fn month_offset(base: YearMonth, month: YearMonth) -> f64 {
    ((month.year() - base.year()) * 12 + month.month() as i32 - base.month() as i32) as f64
}

/// Months before `current`; the current month is still incomplete.
fn completed_months(series: &[MonthCount], current: YearMonth) -> &[MonthCount] {
    &series[..series.partition_point(|c| c.month < current)]
}

/// Authors with more than `min_commits` commits, most active first.
pub fn author_bars(
    commits: &BTreeMap<String, usize>,
    min_commits: usize,
    title: String,
) -> BarData {
    let mut authors: Vec<(&String, &usize)> =
        commits.iter().filter(|(_, n)| **n > min_commits).collect();
    authors.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let bars = authors
        .into_iter()
        .map(|(name, n)| (name.clone(), *n as u64, PALETTE[3]))
        .collect();

    BarData {
        title,
        direction: Direction::Horizontal,
        groups: vec![(String::new(), bars)],
    }
}

/// Unique commit authors per month, with rolling averages.
pub fn authors_over_time(
    stats: &CommitStats,
    window: usize,
    current: YearMonth,
    title: String,
) -> Result<SeriesChart> {
    let authors = completed_months(&stats.authors_per_month, current);
    let multi = completed_months(&stats.multi_authors_per_month, current);
    let new = completed_months(&stats.new_authors_per_month, current);

    let mut chart = SeriesChart::new(title);
    let Some(base) = authors.first().map(|c| c.month) else {
        return Ok(chart);
    };

    chart.push_monthly(base, "Authors / month", Color::White, authors, Some(window))?;
    chart.push_monthly(
        base,
        "Authors with >1 commit / month",
        Color::Red,
        multi,
        Some(window),
    )?;
    chart.push_monthly(base, "New authors / month", PALETTE[3], new, None)?;
    Ok(chart)
}

/// Issues and PRs opened and closed per month, with rolling averages.
pub fn issues_prs_over_time(
    stats: &IssuePrStats,
    window: usize,
    current: YearMonth,
    title: String,
) -> Result<SeriesChart> {
    let series = [
        ("PRs opened / month", &stats.pull_requests.open_per_month),
        ("PRs closed / month", &stats.pull_requests.close_per_month),
        ("Issues opened / month", &stats.issues.open_per_month),
        ("Issues closed / month", &stats.issues.close_per_month),
    ];

    let mut chart = SeriesChart::new(title);
    let Some(base) = series
        .iter()
        .filter_map(|(_, data)| completed_months(data, current).first().map(|c| c.month))
        .min()
    else {
        return Ok(chart);
    };

    for (i, (name, data)) in series.iter().enumerate() {
        let data = completed_months(data, current);
        chart.push_monthly(base, name, PALETTE[i], data, Some(window))?;
    }
    Ok(chart)
}

/// Refereed citations per year for each bibcode.
///
/// Completed years are drawn as lines; the current year appears as a
/// year-to-date point and as a full-year projection.
pub fn citations_over_time(
    citations: &[CitationSeries],
    now: DateTime<Utc>,
    title: String,
) -> SeriesChart {
    let mut chart = SeriesChart::new(title);
    chart.x_axis = XAxis::Years;

    for (i, cites) in citations.iter().enumerate() {
        let color = if cites.name == ALL_CITATIONS {
            Color::White
        } else {
            PALETTE[i % PALETTE.len()]
        };
        let point = |(year, count): (i32, usize)| vec![(year as f64, count as f64)];

        chart.series.push(Series {
            name: format!("{}, N = {}", cites.name, cites.total),
            color,
            smoothed: true,
            points: cites
                .completed_years()
                .iter()
                .map(|&(year, count)| (year as f64, count as f64))
                .collect(),
        });
        if let (Some(ytd), Some(projected)) = (cites.year_to_date(), cites.projected(now)) {
            chart.series.push(Series {
                name: format!("{}: {} to date", cites.name, ytd.0),
                color,
                smoothed: false,
                points: point(ytd),
            });
            chart.series.push(Series {
                name: format!("{}: {} projected", cites.name, projected.0),
                color,
                smoothed: false,
                points: point(projected),
            });
        }
    }
    chart
}

/// Currently open issues and PRs per configured label.
pub fn open_items(stats: &IssuePrStats, title: String) -> BarData {
    let groups = stats
        .issues
        .label_open
        .iter()
        .zip(&stats.pull_requests.label_open)
        .map(|(issues, prs)| {
            (
                issues.label.clone(),
                vec![
                    ("I".to_string(), issues.open as u64, PALETTE[3]),
                    ("PR".to_string(), prs.open as u64, Color::Red),
                ],
            )
        })
        .collect();

    BarData {
        title,
        direction: Direction::Vertical,
        groups,
    }
}

/// Render a widget into an off-screen buffer and return its text.
pub fn render_to_text(widget: impl Widget, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    widget.render(area, &mut buf);

    let mut text = String::new();
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .filter_map(|x| buf.cell((x, y)).map(|cell| cell.symbol()))
            .collect();
        text.push_str(line.trim_end());
        text.push('\n');
    }
    text
}
