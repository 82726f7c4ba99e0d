use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use crate::app::{App, Focus, InputMode};
use crate::transcript::{Entry, EntryKind};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, file field, question field, footer
    let [header_area, transcript_area, file_area, question_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, transcript_area);
    render_file_field(app, frame, file_area);
    render_question_field(app, frame, question_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let busy_indicator = if app.busy { " [uploading] " } else { "" };

    let title = Line::from(vec![
        Span::styled(" Chat with your PDF ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.backend.base_url(), Style::default().fg(Color::Gray)),
        Span::styled(busy_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// One rendered line per entry: kind decides label prefix and color.
fn entry_line(entry: &Entry) -> Line<'_> {
    match entry.kind {
        EntryKind::Question => Line::from(vec![
            Span::styled("Q: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(entry.text.as_str()),
        ]),
        EntryKind::Answer => Line::from(vec![
            Span::styled("A: ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(entry.text.as_str()),
        ]),
        EntryKind::Error => Line::from(Span::styled(
            format!("❌ {}", entry.text),
            Style::default().fg(Color::Red),
        )),
        EntryKind::Success => Line::from(Span::styled(
            entry.text.as_str(),
            Style::default().fg(Color::Green),
        )),
        EntryKind::Info => Line::from(Span::styled(
            entry.text.as_str(),
            Style::default().fg(Color::Blue),
        )),
    }
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Transcript;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Transcript ");

    // Store inner dimensions for scroll calculations
    let inner = block.inner(area);
    app.transcript_height = inner.height;
    app.transcript_width = inner.width;

    if app.transcript.is_empty() && !app.ask_in_flight() {
        let placeholder = Paragraph::new("Your chat history will appear here…")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for entry in app.transcript.entries() {
        lines.push(entry_line(entry));
        lines.push(Line::default());
    }

    if app.ask_in_flight() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = lines.len() as u16;

    let transcript = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);

    if total_lines > app.transcript_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.transcript_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_file_field(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::FileInput && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if app.focus == Focus::FileInput {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let title = match &app.selected_file {
        Some(path) => format!(" PDF — selected: {} ", path.display()),
        None => " PDF — none selected ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let input = Paragraph::new(app.file_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((
            area.x + app.file_cursor as u16 + 1,
            area.y + 1,
        ));
    }
}

fn render_question_field(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::QuestionInput && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if app.focus == Focus::QuestionInput {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask a question ");

    let input = Paragraph::new(app.question_input.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((
            area.x + app.question_cursor as u16 + 1,
            area.y + 1,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" f ", key_style),
                Span::styled(" file ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" ask ", label_style),
            ];
            if app.selected_file.is_some() && !app.upload_in_flight() {
                hints.extend(vec![
                    Span::styled(" u ", key_style),
                    Span::styled(" upload ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        InputMode::Editing => match app.focus {
            Focus::FileInput => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" select ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
            ],
            _ => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
        },
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
