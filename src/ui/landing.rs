//! Landing screen: current conditions, combined timeline, 7-day outlook
//!
//! Renders the whole session state in one vertical layout. Temperatures are
//! stored in Celsius and converted to the selected unit here, at the edge.

use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::TemperatureUnit;
use crate::forecast::TimelineEntry;
use crate::session::SessionState;

/// Color palette for the current theme
struct Palette {
    text: Color,
    accent: Color,
    dim: Color,
}

fn palette(dark: bool) -> Palette {
    if dark {
        Palette {
            text: Color::White,
            accent: Color::Cyan,
            dim: Color::DarkGray,
        }
    } else {
        Palette {
            text: Color::Black,
            accent: Color::Blue,
            dim: Color::Gray,
        }
    }
}

/// Renders the landing screen
pub fn render(frame: &mut Frame, app: &App) {
    let state = app.state();
    let colors = palette(app.dark_theme());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // header
            Constraint::Length(7),  // current conditions
            Constraint::Length(5),  // timeline
            Constraint::Min(9),     // outlook
        ])
        .split(frame.area());

    render_header(frame, chunks[0], &state, &colors);
    render_current(frame, chunks[1], &state, app.unit, &colors);
    render_timeline(frame, chunks[2], &state, app.unit, &colors);
    render_outlook(frame, chunks[3], &state, app.unit, &colors);
}

fn render_header(frame: &mut Frame, area: Rect, state: &SessionState, colors: &Palette) {
    let place = state.place_name.as_deref().unwrap_or("Locating...");
    let mut spans = vec![Span::styled(
        place.to_string(),
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(updated) = state.last_updated_millis.and_then(format_updated_at) {
        spans.push(Span::styled(
            format!("  updated {}", updated),
            Style::default().fg(colors.dim),
        ));
    }
    if state.is_loading {
        spans.push(Span::styled(
            "  refreshing...",
            Style::default().fg(colors.dim),
        ));
    }
    if !state.is_network_available {
        spans.push(Span::styled("  offline", Style::default().fg(Color::Red)));
    }
    if let Some(error) = &state.error_message {
        spans.push(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Skycast "));
    frame.render_widget(header, area);
}

fn render_current(
    frame: &mut Frame,
    area: Rect,
    state: &SessionState,
    unit: TemperatureUnit,
    colors: &Palette,
) {
    let block = Block::default().borders(Borders::ALL).title(" Now ");

    let Some(current) = &state.current else {
        let placeholder = Paragraph::new("Waiting for forecast data...")
            .style(Style::default().fg(colors.dim))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let high_low = match (state.today_high, state.today_low) {
        (Some(high), Some(low)) => format!(
            "H {}{}  L {}{}",
            unit.display(high),
            unit.symbol(),
            unit.display(low),
            unit.symbol()
        ),
        _ => "H --  L --".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{}  {}{}", current.icon, unit.display(current.temperature), unit.symbol()),
                Style::default()
                    .fg(colors.text)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", current.label),
                Style::default().fg(colors.accent),
            ),
        ]),
        Line::from(Span::styled(
            format!(
                "Feels like {}{}",
                unit.display(current.apparent_temperature),
                unit.symbol()
            ),
            Style::default().fg(colors.text),
        )),
        Line::from(Span::styled(high_low, Style::default().fg(colors.text))),
        Line::from(vec![
            Span::styled(
                format!("Wind {}", current.wind_text),
                Style::default().fg(colors.dim),
            ),
            Span::styled(
                format!("  Humidity {}", current.humidity_text),
                Style::default().fg(colors.dim),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_timeline(
    frame: &mut Frame,
    area: Rect,
    state: &SessionState,
    unit: TemperatureUnit,
    colors: &Palette,
) {
    let block = Block::default().borders(Borders::ALL).title(" Next 24h ");

    let Some(timeline) = &state.timeline else {
        let placeholder = Paragraph::new("No hourly data")
            .style(Style::default().fg(colors.dim))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    // One column per entry; as many as fit the width
    let column_width = 8usize;
    let visible = (area.width.saturating_sub(2) as usize) / column_width;

    let mut times = Vec::new();
    let mut icons = Vec::new();
    let mut values = Vec::new();
    for entry in timeline.iter().take(visible) {
        match entry {
            TimelineEntry::Condition(sample) => {
                times.push(Span::styled(
                    format!("{:<8}", sample.clock_time),
                    Style::default().fg(colors.dim),
                ));
                icons.push(Span::raw(format!(
                    "{:<7}",
                    sample.classification.icon
                )));
                values.push(Span::styled(
                    format!(
                        "{:<8}",
                        format!(
                            "{}{}",
                            unit.display(sample.sample.temperature.round() as i32),
                            unit.symbol()
                        )
                    ),
                    Style::default().fg(colors.text),
                ));
            }
            TimelineEntry::Sun(event) => {
                times.push(Span::styled(
                    format!("{:<8}", event.clock_time),
                    Style::default().fg(Color::Yellow),
                ));
                icons.push(Span::raw(format!("{:<7}", event.icon)));
                values.push(Span::styled(
                    format!("{:<8}", event.kind.label()),
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
    }

    let lines = vec![Line::from(times), Line::from(icons), Line::from(values)];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_outlook(
    frame: &mut Frame,
    area: Rect,
    state: &SessionState,
    unit: TemperatureUnit,
    colors: &Palette,
) {
    let block = Block::default().borders(Borders::ALL).title(" 7-Day Outlook ");

    let Some(outlook) = &state.daily_outlook else {
        let placeholder = Paragraph::new("No daily data")
            .style(Style::default().fg(colors.dim))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let rows: Vec<Row> = outlook
        .iter()
        .map(|day| {
            Row::new(vec![
                Cell::from(day.day_name.clone()).style(Style::default().fg(colors.accent)),
                Cell::from(day.day_icon),
                Cell::from(format!(
                    "{}{} / {}{}",
                    unit.display(day.high),
                    unit.symbol(),
                    unit.display(day.low),
                    unit.symbol()
                ))
                .style(Style::default().fg(colors.text)),
                Cell::from(format!("{}%", day.precipitation_chance))
                    .style(Style::default().fg(colors.dim)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Length(6),
        ],
    )
    .block(block)
    .column_spacing(1);

    frame.render_widget(table, area);
}

/// Renders a centered loading message before the first state arrives
pub fn render_loading(frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading weather data...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    frame.render_widget(loading_text, chunks[1]);
}

fn format_updated_at(millis: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CurrentConditions;
    use ratatui::{backend::TestBackend, Terminal};

    fn state_with_current() -> SessionState {
        SessionState {
            place_name: Some("Vancouver, British Columbia".to_string()),
            current: Some(CurrentConditions {
                temperature: 18,
                apparent_temperature: 19,
                weather_code: 2,
                icon: "\u{26C5}",
                label: "Partly Cloudy",
                wind_text: "12.5 km/h WNW".to_string(),
                humidity_text: "65%".to_string(),
                is_daytime: true,
            }),
            today_high: Some(22),
            today_low: Some(13),
            ..Default::default()
        }
    }

    fn render_to_text(state: SessionState, unit: TemperatureUnit, dark: bool) -> String {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let colors = palette(dark);
        terminal
            .draw(|frame| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(7),
                        Constraint::Length(5),
                        Constraint::Min(9),
                    ])
                    .split(frame.area());
                render_header(frame, chunks[0], &state, &colors);
                render_current(frame, chunks[1], &state, unit, &colors);
                render_timeline(frame, chunks[2], &state, unit, &colors);
                render_outlook(frame, chunks[3], &state, unit, &colors);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_renders_place_name_and_current_conditions() {
        let content = render_to_text(state_with_current(), TemperatureUnit::Celsius, false);
        assert!(content.contains("Vancouver, British Columbia"));
        assert!(content.contains("Partly Cloudy"));
        assert!(content.contains("18"));
        assert!(content.contains("12.5 km/h WNW"));
        assert!(content.contains("65%"));
    }

    #[test]
    fn test_renders_fahrenheit_conversion() {
        let content = render_to_text(state_with_current(), TemperatureUnit::Fahrenheit, false);
        // 18 C -> 64 F, high 22 -> 71, low 13 -> 55
        assert!(content.contains("64"));
        assert!(content.contains("71"));
        assert!(content.contains("55"));
    }

    #[test]
    fn test_renders_placeholders_without_data() {
        let content = render_to_text(SessionState::default(), TemperatureUnit::Celsius, true);
        assert!(content.contains("Locating..."));
        assert!(content.contains("Waiting for forecast data..."));
        assert!(content.contains("No hourly data"));
        assert!(content.contains("No daily data"));
    }

    #[test]
    fn test_renders_error_and_offline_markers() {
        let state = SessionState {
            is_network_available: false,
            error_message: Some("Failed to refresh weather data.".to_string()),
            ..state_with_current()
        };
        let content = render_to_text(state, TemperatureUnit::Celsius, false);
        assert!(content.contains("offline"));
        assert!(content.contains("Failed to refresh weather data."));
    }
}
