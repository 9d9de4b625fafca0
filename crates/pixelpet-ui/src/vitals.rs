use pixelpet_core::pet::Pet;
use pixelpet_core::status::StatusTag;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
    Frame,
};

/// Clamp a 0–100 value to a ratio safe for [`LineGauge::ratio`].
fn clamp_ratio(value: u8) -> f64 {
    (f64::from(value) / 100.0).clamp(0.0, 1.0)
}

/// Pick a colour once `value` reaches the warning or critical level.
fn threshold_color(value: u8, warn: u8, crit: u8, normal: Color) -> Color {
    if value >= crit {
        Color::Red
    } else if value >= warn {
        Color::Yellow
    } else {
        normal
    }
}

pub fn status_color(tag: StatusTag) -> Color {
    match tag {
        StatusTag::Healthy | StatusTag::Full => Color::Green,
        StatusTag::Hungry | StatusTag::Bored => Color::Yellow,
        StatusTag::Sad => Color::Blue,
        StatusTag::Sick => Color::Magenta,
        StatusTag::Deceased => Color::Red,
    }
}

/// Render the vitals panel: health and hunger gauges, status tags, mood and
/// personality.
pub fn render_vitals(f: &mut Frame, area: Rect, pet: &Pet) {
    let block = Block::default().borders(Borders::ALL).title("VITALS");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let rows = Layout::vertical([
        Constraint::Length(1), // health
        Constraint::Length(1), // hunger
        Constraint::Length(1), // status
        Constraint::Length(1), // mood
        Constraint::Length(1), // traits
        Constraint::Min(0),
    ])
    .split(inner);

    let state = &pet.state;
    let health = state.health();
    let hunger = state.hunger();

    // Health is good when high, so colour by how much is missing.
    render_gauge(
        f,
        rows[0],
        format!("HP   {health:>3}"),
        health,
        threshold_color(100 - health, 30, 50, Color::Green),
    );
    render_gauge(
        f,
        rows[1],
        format!("FOOD {hunger:>3}"),
        hunger,
        threshold_color(hunger, 12, 70, Color::Cyan),
    );

    let mut spans = vec![Span::raw("Status: ")];
    if state.status.is_empty() {
        spans.push("content".dark_gray());
    }
    for (i, tag) in state.status.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            tag.as_str(),
            Style::default().fg(status_color(tag)).bold(),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), rows[2]);

    let mood = Line::from(vec![Span::raw("Mood:   "), Span::raw(pet.emotion.as_str()).italic()]);
    f.render_widget(Paragraph::new(mood), rows[3]);

    let traits = Line::from(vec![
        Span::raw("Traits: "),
        Span::styled(pet.traits_joined(), Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(traits), rows[4]);
}

fn render_gauge(f: &mut Frame, area: Rect, label: String, value: u8, color: Color) {
    let gauge = LineGauge::default()
        .ratio(clamp_ratio(value))
        .label(label)
        .filled_style(Style::default().fg(color))
        .unfilled_style(Style::default().fg(Color::DarkGray));
    f.render_widget(gauge, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pixelpet_core::roster::Roster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::{backend::TestBackend, Terminal};

    fn pet() -> Pet {
        let roster = Roster::embedded().unwrap();
        let mut pet = Pet::candidate(&roster, &mut StdRng::seed_from_u64(1), Utc::now());
        pet.characteristics = ["Witty".into(), "Shy".into(), "Brave".into()];
        pet
    }

    fn render_to_text(width: u16, height: u16, pet: &Pet) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| render_vitals(f, f.area(), pet))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect()
    }

    #[test]
    fn shows_gauges_and_traits() {
        let text = render_to_text(50, 8, &pet());
        assert!(text.contains("HP   100"));
        assert!(text.contains("FOOD  10"));
        assert!(text.contains("Witty, Shy, Brave"));
        assert!(text.contains("content"));
    }

    #[test]
    fn lists_status_tags() {
        let mut p = pet();
        p.state.status.insert(StatusTag::Hungry);
        p.state.status.insert(StatusTag::Sick);
        let text = render_to_text(50, 8, &p);
        assert!(text.contains("Hungry Sick"));
        assert!(!text.contains("content"));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let _ = render_to_text(2, 2, &pet());
    }

    #[test]
    fn thresholds_pick_colors() {
        assert_eq!(threshold_color(5, 12, 70, Color::Cyan), Color::Cyan);
        assert_eq!(threshold_color(12, 12, 70, Color::Cyan), Color::Yellow);
        assert_eq!(threshold_color(90, 12, 70, Color::Cyan), Color::Red);
        assert_eq!(clamp_ratio(100), 1.0);
        assert_eq!(clamp_ratio(0), 0.0);
    }
}
