use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table};

use crate::battle::engine::{MAX_BONUS_SCORE, MAX_PATTERN_SCORE};
use crate::battle::{ranking, winner, RoundConfig, RoundKey};
use crate::output::format_points;
use crate::tui::app::{App, Focus, InputMode};

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 8 || area.width < 40 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Grid(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_round(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);

    match app.input_mode {
        InputMode::Help => render_help_popup(frame, app),
        InputMode::Results => render_results_popup(frame, app),
        InputMode::Normal => {}
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled("Battle Judge", app.theme.title_style)];

    let sequencer = app.session.sequencer();
    if let Some(key) = sequencer.current() {
        let round_text = format!(
            "Ronda {}/{}: {}",
            sequencer.position() + 1,
            sequencer.len(),
            app.session.round_label(key)
        );
        let left_len = "Battle Judge".len();
        let padding_len = (area.width as usize).saturating_sub(left_len + round_text.chars().count());
        spans.push(Span::raw(" ".repeat(padding_len)));
        spans.push(Span::styled(round_text, Style::default().fg(app.theme.title_color).bold()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_round(frame: &mut Frame, area: Rect, app: &App) {
    let (Some(key), Some(round)) = (
        app.current_key(),
        app.session.current_round().and_then(|k| app.session.round_config(k)),
    ) else {
        let msg = Paragraph::new("No rounds configured. Press n to finish the battle.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted));
        frame.render_widget(msg, area);
        return;
    };

    let contestants = app.session.contestants();
    if contestants.is_empty() {
        let msg = Paragraph::new("No MCs in this battle.").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    let columns = Layout::horizontal(vec![Constraint::Fill(1); contestants.len()]).split(area);
    let focused = app.focused();
    for (mc, column) in columns.iter().enumerate() {
        render_contestant(frame, *column, app, &key, round, mc, focused);
    }
}

fn render_contestant(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    key: &RoundKey,
    round: &RoundConfig,
    mc: usize,
    focused: Option<Focus>,
) {
    let theme = &app.theme;
    let contestant = &app.session.contestants()[mc];
    let sheet = app.session.sheet(key, &contestant.id);
    let responses = round.responses_enabled();
    let patterns = round.patterns_per_turn as usize;

    let block = Block::bordered()
        .title(Span::styled(format!(" {} ", contestant.name), theme.popup_title))
        .border_style(Style::default().fg(if focused.map(|f| f.mc()) == Some(mc) {
            theme.popup_border
        } else {
            theme.muted
        }));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let bonuses = round.numeric_bonuses();
    let sections = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(bonuses.len() as u16),
        Constraint::Length(2),
    ])
    .split(inner);

    // Interventions grid
    let rows: Vec<Row> = (0..round.turns_per_mc as usize)
        .map(|turn| {
            let mut cells = vec![Cell::from(format!("{}.", turn + 1))
                .style(Style::default().fg(theme.index_color))];
            for pattern in 0..patterns {
                let slot = sheet.and_then(|s| s.pattern(turn, pattern));
                let value = slot.and_then(|p| p.value);
                let marker = if responses && slot.map(|p| p.is_response).unwrap_or(false) {
                    "*"
                } else {
                    ""
                };
                let text = match value {
                    Some(v) => format!("{}{}", format_points(v), marker),
                    None => format!("·{}", marker),
                };
                let mut style = match value {
                    Some(v) => Style::default().fg(theme.score_color(v, MAX_PATTERN_SCORE)),
                    None => Style::default().fg(theme.unscored),
                };
                if focused == Some(Focus::Pattern { mc, turn, pattern }) {
                    style = style.patch(theme.focus);
                }
                cells.push(Cell::from(text).style(style));
            }

            let row_style = if turn % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };
            Row::new(cells).style(row_style)
        })
        .collect();

    let mut widths = vec![Constraint::Length(3)];
    widths.extend(std::iter::repeat(Constraint::Length(5)).take(patterns));
    let table = Table::new(rows, widths).header(
        Row::new(
            std::iter::once("#".to_string())
                .chain((1..=patterns).map(|p| format!("P{}", p)))
                .collect::<Vec<_>>(),
        )
        .style(theme.header_style),
    );
    frame.render_widget(table, sections[0]);

    // Bonus inputs
    let bonus_lines: Vec<Line> = bonuses
        .iter()
        .map(|category| {
            let value = sheet
                .and_then(|s| s.bonus.get(category).copied())
                .unwrap_or(0.0);
            let mut style = Style::default().fg(theme.score_color(value, MAX_BONUS_SCORE));
            if focused == Some(Focus::Bonus { mc, category: *category }) {
                style = style.patch(theme.focus);
            }
            Line::from(vec![
                Span::styled(format!("{:<14}", category.label()), Style::default().fg(theme.muted)),
                Span::styled(format!("{:>4}", format_points(value)), style),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(bonus_lines), sections[1]);

    // Totals
    let totals = vec![
        Line::from(vec![
            Span::styled("Ronda ", Style::default().fg(theme.muted)),
            Span::styled(
                format_points(app.session.round_subtotal(key, &contestant.id)),
                Style::default().bold(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Total ", Style::default().fg(theme.muted)),
            Span::styled(
                format_points(app.session.grand_total(&contestant.id)),
                Style::default().bold(),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(totals), sections[2]);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Failed") || msg.starts_with("Error") {
            theme.flash_error
        } else {
            theme.flash_success
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let hints: Vec<(&str, &str)> = match app.input_mode {
            InputMode::Results => vec![("p", ":back "), ("?", ":help "), ("q", ":quit")],
            _ => {
                let mut hints = vec![
                    ("←↑↓→", ":move "),
                    ("0-8", ":score "),
                    ("+/-", ":step "),
                ];
                let responses = app
                    .session
                    .current_round()
                    .and_then(|k| app.session.round_config(k))
                    .map(|r| r.responses_enabled())
                    .unwrap_or(false);
                if responses {
                    hints.push(("r", ":response "));
                }
                let next_label = if app.session.sequencer().is_last() {
                    ":finish "
                } else {
                    ":next "
                };
                hints.extend([("n", next_label), ("p", ":prev "), ("?", ":help "), ("q", ":quit")]);
                hints
            }
        };

        let mut spans = Vec::new();
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

fn render_help_popup(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(52, 15, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(" Keyboard Shortcuts ")
        .border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let key_style = Style::default().fg(app.theme.status_key_color).bold();
    let entries = [
        ("j / Down      ", "Next cell"),
        ("k / Up        ", "Previous cell"),
        ("l / Tab       ", "Same cell, next MC"),
        ("h / BackTab   ", "Same cell, previous MC"),
        ("0-8           ", "Score 0 to 4 in half points"),
        ("+ / -         ", "Raise or lower by half a point"),
        ("r             ", "Toggle response (RESPUESTAS)"),
        ("n             ", "Next round (finish on the last)"),
        ("p             ", "Previous round"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];
    let mut help_lines: Vec<Line> = entries
        .iter()
        .map(|(key, text)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*text)]))
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(app.theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

fn render_results_popup(frame: &mut Frame, app: &App) {
    let standings = ranking(&app.session);
    let height = (standings.len() as u16).saturating_add(7);
    let popup_area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Resultados ", app.theme.popup_title))
        .border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let mut lines: Vec<Line> = standings
        .iter()
        .enumerate()
        .map(|(idx, standing)| {
            Line::from(vec![
                Span::styled(format!("{:>2}. ", idx + 1), Style::default().fg(app.theme.index_color)),
                Span::styled(format!("{:>6}  ", format_points(standing.total)), Style::default().bold()),
                Span::raw(standing.contestant.name.clone()),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(match winner(&app.session) {
        Some(c) => Line::from(vec![
            Span::raw("Winner: "),
            Span::styled(c.name.clone(), app.theme.winner),
        ]),
        None => Line::from(Span::styled("Tie: no winner", Style::default().fg(app.theme.score_mid))),
    });
    lines.push(Line::from(""));
    let report_line = if app.report_saved {
        format!("Report: {}", app.report_path.display())
    } else {
        "Report was not saved".to_string()
    };
    lines.push(Line::from(Span::styled(report_line, Style::default().fg(app.theme.muted))));

    frame.render_widget(Paragraph::new(lines), inner);
}
