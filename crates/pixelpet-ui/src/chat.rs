use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const PROMPT: &str = "> ";

/// A single-line text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    text: String,
    max_chars: Option<usize>,
}

impl InputLine {
    pub fn with_limit(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            max_chars: Some(max_chars),
        }
    }

    pub fn push(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        if self.max_chars.is_some_and(|max| self.text.chars().count() >= max) {
            return;
        }
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Return the text and empty the field.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Terminal columns the text occupies.
    pub fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }
}

fn history_line(line: &str) -> Line<'_> {
    let (prefix, color, modifier) = if line.starts_with("You:") {
        ("You:", Color::Cyan, Modifier::empty())
    } else if line.starts_with("Pet:") {
        ("Pet:", Color::Green, Modifier::empty())
    } else if line.starts_with("Your pet reacted:") {
        ("Your pet reacted:", Color::Yellow, Modifier::ITALIC)
    } else {
        return Line::from(line);
    };
    Line::from(vec![
        Span::styled(prefix, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(&line[prefix.len()..], Style::default().add_modifier(modifier)),
    ])
}

/// Render the conversation panel, newest lines at the bottom.
///
/// With `input` the last row becomes an editable prompt and, when
/// `focused`, the terminal cursor is placed after its text.
pub fn render_chat(
    f: &mut Frame,
    area: Rect,
    history: &str,
    input: Option<&InputLine>,
    focused: bool,
) {
    let title = if focused { "CHAT (Enter to send, Esc to leave)" } else { "CHAT" };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let input_rows = u16::from(input.is_some()).min(inner.height);
    let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(input_rows)]).split(inner);

    let visible = rows[0].height as usize;
    let lines: Vec<&str> = history.lines().filter(|l| !l.trim().is_empty()).collect();
    let shown: Vec<Line> = lines
        .iter()
        .skip(lines.len().saturating_sub(visible))
        .map(|l| history_line(l))
        .collect();
    if shown.is_empty() && visible > 0 {
        f.render_widget(
            Paragraph::new(Line::from("Say hello to your pet!"))
                .style(Style::default().fg(Color::DarkGray)),
            rows[0],
        );
    } else {
        f.render_widget(Paragraph::new(shown), rows[0]);
    }

    if let Some(input) = input {
        if rows[1].height == 0 {
            return;
        }
        let line = Line::from(vec![
            Span::styled(PROMPT, Style::default().fg(Color::Yellow)),
            Span::raw(input.as_str()),
        ]);
        f.render_widget(Paragraph::new(line), rows[1]);
        if focused {
            let offset = (PROMPT.len() + input.width()).min(usize::from(u16::MAX)) as u16;
            let x = rows[1].x.saturating_add(offset).min(rows[1].right().saturating_sub(1));
            f.set_cursor_position(Position::new(x, rows[1].y));
        }
    }
}
