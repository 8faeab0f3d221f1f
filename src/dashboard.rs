use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    style::{Color as TermColor, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

use crate::emotion::Emotion;
use crate::report::EmotionReport;

fn emotion_color(emotion: Emotion) -> Color {
    let (r, g, b) = emotion.rgb();
    Color::Rgb(r, g, b)
}

fn next_row(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    })
}

fn previous_row(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(0) | None => len - 1,
        Some(i) => i - 1,
    })
}

/// Interactive results view; `source` is shown in the title (URL or file).
pub fn run_dashboard(report: &EmotionReport, source: &str) -> io::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();
    table_state.select(next_row(None, report.len()));

    let result = event_loop(&mut terminal, report, source, &mut table_state);

    // Restore terminal even if drawing failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    report: &EmotionReport,
    source: &str,
    table_state: &mut TableState,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, report, source, table_state))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Down => table_state.select(next_row(table_state.selected(), report.len())),
                    KeyCode::Up => table_state.select(previous_row(table_state.selected(), report.len())),
                    _ => {}
                }
            }
        }
    }
}

fn ui(f: &mut Frame, report: &EmotionReport, source: &str, table_state: &mut TableState) {
    let rects = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(60),
            Constraint::Min(8),
        ])
        .margin(1)
        .split(f.size());

    let headline = Paragraph::new(format!("Scraped {} reviews.  (q to quit)", report.len())).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Review Emotions: {}", source)),
    );
    f.render_widget(headline, rects[0]);

    let header_cells = ["Review", "Emotion"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = report.rows.iter().map(|row| {
        let style = Style::default()
            .bg(emotion_color(row.emotion))
            .fg(Color::Black);
        Row::new(vec![
            Cell::from(row.review.replace('\n', " ")),
            Cell::from(row.emotion.as_str()),
        ])
        .style(style)
    });

    let table = Table::new(rows, [Constraint::Min(20), Constraint::Length(10)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Reviews and Emotions"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, rects[1], table_state);

    let bars: Vec<Bar> = report
        .distribution()
        .into_iter()
        .map(|(emotion, count)| {
            Bar::default()
                .value(count as u64)
                .label(Line::from(emotion.as_str()))
                .style(Style::default().fg(emotion_color(emotion)))
        })
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Emotion Distribution"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(2);
    f.render_widget(chart, rects[2]);
}

/// Plain stdout rendering for non-interactive use.
pub fn print_plain(report: &EmotionReport) {
    println!("Scraped {} reviews.", report.len());
    println!();
    println!("### Reviews and Emotions");
    for row in &report.rows {
        let (r, g, b) = row.emotion.rgb();
        println!(
            "{} {}",
            format!("{:<10}", row.emotion.as_str()).with(TermColor::Rgb { r, g, b }),
            row.review.replace('\n', " ")
        );
    }

    println!();
    println!("### Emotion Distribution");
    for (emotion, count) in report.distribution() {
        let (r, g, b) = emotion.rgb();
        println!(
            "{:<10} {:>5} {}",
            emotion.as_str(),
            count,
            "#".repeat(count.min(60)).with(TermColor::Rgb { r, g, b })
        );
    }
}
