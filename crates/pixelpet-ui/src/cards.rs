use pixelpet_core::pet::Pet;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::chat::InputLine;
use crate::layout::centered;

/// Profile card for an adoption candidate.
///
/// While `naming`, the card ends with the name prompt.
pub fn render_candidate(f: &mut Frame, area: Rect, pet: &Pet, name: &InputLine, naming: bool) {
    let card = centered(area, 56, 12);
    f.render_widget(Clear, card);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("ADOPT A PET")
        .border_style(Style::default().fg(Color::Yellow));

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Species:     "),
            Span::raw(pet.animal_type.as_str()).bold(),
        ]),
        Line::from(vec![
            Span::raw("Personality: "),
            Span::styled(pet.traits_joined(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(format!(
            "Health {}  Hunger {}",
            pet.state.health(),
            pet.state.hunger()
        )),
        Line::from(""),
    ];

    if naming {
        lines.push(Line::from("Name your new friend (blank keeps a placeholder):"));
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(name.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    } else {
        lines.push(Line::from("Adopt this pet, or look for another?".italic()));
    }

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        card,
    );
}

/// Game-over card naming the departed pet.
///
/// `image` describes where the farewell picture was saved, or why none was
/// produced.
pub fn render_farewell(f: &mut Frame, area: Rect, pet: &Pet, image: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("GAME OVER")
        .border_style(Style::default().fg(Color::Red));

    let lines = vec![
        Line::from(format!("{} the {} has passed away.", pet.name, pet.animal_type)).bold(),
        Line::from(""),
        Line::from(format!("They were {}.", pet.traits_joined().to_lowercase())),
        Line::from(""),
        Line::from(image.to_string()).fg(Color::DarkGray),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}
