use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// One-line title bar: `PIXELPET | {title} | {status}`.
pub fn render_top_bar(f: &mut Frame, area: Rect, title: &str, status: &str) {
    let line = Line::from(vec![
        Span::styled(
            " PIXELPET ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {title} ")),
        Span::styled(format!("| {status}"), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Key hints such as `[f] Feed  [q] Quit`.
pub fn render_help(f: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, action) in hints {
        spans.push(Span::styled(
            format!("[{key}]"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {action}  ")));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
