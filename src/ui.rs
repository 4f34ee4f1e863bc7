use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use crate::app::{App, View};
use crate::list_view;

const ENTER_LABEL: &str = "Enter";
const ENTER_WIDTH: u16 = 9;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, input, footer
    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.view {
        View::Chat => render_chat(app, frame, body_area),
        View::Find => render_find(app, frame, body_area),
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let project = app.project.borrow();
    let layers = if project.is_empty() {
        String::new()
    } else {
        let last = project.layers().last().map(|l| l.name.as_str()).unwrap_or_default();
        format!(" [{} layers, last: {}]", project.len(), last)
    };

    let title = Line::from(vec![
        Span::styled(" Kue ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.model_name.clone(), Style::default().fg(Color::White)),
        Span::styled(layers, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = if app.pending_replies > 0 {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(app.animation_frame as usize + 1);
        format!(" Kue chat: thinking{} ", dots)
    } else if !app.chat_state.is_following() {
        " Kue chat [scrolled, PgDn for latest] ".to_string()
    } else {
        " Kue chat ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.transcript.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "Ask Kue about your map, or type /find to search for data...",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(hint, inner);
        app.chat_state.reset();
        return;
    }

    list_view::render(
        &app.chat_delegate,
        app.transcript.messages(),
        inner,
        frame.buffer_mut(),
        &mut app.chat_state,
    );
}

fn render_find(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = match &app.find_status {
        Some(status) => format!(" Find: {} ", status),
        None => format!(" Find ({}) ", app.find_results.len()),
    };
    let border = if app.find_status.is_some() { Color::Red } else { Color::Cyan };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    list_view::render(
        &app.find_delegate,
        &app.find_results,
        inner,
        frame.buffer_mut(),
        &mut app.find_state,
    );
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(ENTER_WIDTH),
    ])
    .areas(area);

    // Store for mouse hit-testing
    app.enter_button_area = Some(button_area);

    let border = match app.view {
        View::Chat => Color::Yellow,
        View::Find => Color::Cyan,
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    let button = Paragraph::new(Line::from(ENTER_LABEL).centered())
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(button, button_area);

    if inner_width > 0 {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.view {
        View::Chat => Style::default().bg(Color::Blue).fg(Color::White),
        View::Find => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.view {
        View::Chat => " CHAT ",
        View::Find => " FIND ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.view {
        View::Chat => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" \u{2191} ", key_style),
            Span::styled(" recall ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" ^L ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ],
        View::Find => vec![
            Span::styled(" \u{2191}/\u{2193} ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" ^O ", key_style),
            Span::styled(" load layer ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
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
