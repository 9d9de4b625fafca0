use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

use pixelpet_config::Settings;
use pixelpet_core::{
    adoption::{adopt, SpritePipeline},
    bus::EventBus,
    error::{SaveError, SessionError},
    event::Event,
    generate::Generator,
    lifecycle::{CareAction, LifecycleEngine, LifecycleRules},
    logging::LogBuffer,
    pet::Pet,
    roster::Roster,
    save::SaveStore,
    session::Session,
};
use pixelpet_sprite::{loader::load_frames, Animation, Frame as SpriteFrame};
use pixelpet_ui::{
    cards::{render_candidate, render_farewell},
    chat::{render_chat, InputLine},
    face::render_face,
    layout::pet_layout,
    log_panel::render_log,
    shell::{render_help, render_top_bar},
    vitals::render_vitals,
};

type BoxedGenerator = Box<dyn Generator>;

const FACE_WIDTH: u16 = 40;
const LOG_HEIGHT: u16 = 6;
const NAME_LIMIT: usize = 24;
const CHAT_LIMIT: usize = 240;

const ADOPTION_HINTS: &[(&str, &str)] = &[("a", "Adopt"), ("r", "Reroll"), ("q", "Quit")];
const NAMING_HINTS: &[(&str, &str)] = &[("Enter", "Confirm"), ("Esc", "Back")];
const CARE_HINTS: &[(&str, &str)] = &[
    ("f", "Feed"),
    ("t", "Treat"),
    ("p", "Play"),
    ("c", "Chat"),
    ("q", "Quit"),
];
const CHAT_HINTS: &[(&str, &str)] = &[("Enter", "Send"), ("Esc", "Stop chatting")];
const DEPARTED_HINTS: &[(&str, &str)] = &[("n", "New pet"), ("q", "Quit")];

enum Stage {
    Adopting(Adoption),
    Caring(Caring),
    Departed(Departed),
}

struct Adoption {
    candidate: Pet,
    naming: bool,
    generator: BoxedGenerator,
}

struct Caring {
    session: Session<BoxedGenerator>,
    chatting: bool,
    animation: Option<Animation>,
}

struct Departed {
    pet: Pet,
    note: String,
    portrait: Option<SpriteFrame>,
    generator: BoxedGenerator,
}

pub struct App {
    stage: Option<Stage>,
    bus: EventBus,
    pipeline: SpritePipeline,
    store: SaveStore,
    engine: LifecycleEngine,
    rng: StdRng,
    input: InputLine,
    status: String,
    frame_interval: Duration,
    log_buffer: LogBuffer,
    quit: bool,
}

impl App {
    /// Resume the saved pet, or start adoption when there is none.
    ///
    /// A corrupt save is logged and treated as missing.
    pub fn new(
        settings: &Settings,
        generator: BoxedGenerator,
        log_buffer: LogBuffer,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let roster = Roster::embedded().context("failed to load the embedded roster")?;
        let store = SaveStore::new(&settings.paths.save_file, roster);

        let loaded = match store.load(now) {
            Ok(pet) => pet,
            Err(SaveError::Corrupt(reason)) => {
                tracing::warn!(
                    path = %store.path().display(),
                    %reason,
                    "save file is corrupt; starting adoption"
                );
                None
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read save file {}", store.path().display())
                })
            }
        };

        let mut app = Self {
            stage: None,
            bus: EventBus::new(),
            pipeline: SpritePipeline::from_settings(settings),
            store,
            engine: LifecycleEngine::new(LifecycleRules::from(&settings.lifecycle)),
            rng: StdRng::from_entropy(),
            input: InputLine::default(),
            status: String::new(),
            frame_interval: Duration::from_millis(settings.sprite.frame_interval_ms),
            log_buffer,
            quit: false,
        };

        let stage = match loaded {
            Some(pet) => {
                tracing::info!(name = %pet.name, animal = %pet.animal_type, "resuming saved pet");
                app.status = format!("Welcome back, {}!", pet.name);
                app.start_caring(pet, generator, Instant::now())
            }
            None => {
                app.status = "Meet a pet looking for a home.".to_string();
                app.start_adoption(generator, now)
            }
        };
        app.stage = Some(stage);
        Ok(app)
    }

    pub fn publish(&mut self, event: Event) {
        self.bus.publish(event);
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Translate a key press into input edits or published events.
    ///
    /// While a text field is focused every printable key is text; only
    /// Enter and Esc leave the field.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.bus.publish(Event::Quit);
            return;
        }

        match &mut self.stage {
            Some(Stage::Adopting(adoption)) if adoption.naming => match key.code {
                KeyCode::Enter => {
                    let name = self.input.take();
                    self.bus.publish(Event::Adopt { name });
                }
                KeyCode::Esc => {
                    adoption.naming = false;
                    self.input.clear();
                }
                KeyCode::Backspace => self.input.backspace(),
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
            Some(Stage::Adopting(adoption)) => match key.code {
                KeyCode::Char('a') | KeyCode::Enter => {
                    adoption.naming = true;
                    self.input = InputLine::with_limit(NAME_LIMIT);
                }
                KeyCode::Char('r') => self.bus.publish(Event::Reroll),
                KeyCode::Char('q') | KeyCode::Esc => self.bus.publish(Event::Quit),
                _ => {}
            },
            Some(Stage::Caring(caring)) if caring.chatting => match key.code {
                KeyCode::Enter => {
                    let message = self.input.take();
                    self.bus.publish(Event::ChatSubmitted(message));
                }
                KeyCode::Esc => {
                    caring.chatting = false;
                    self.input.clear();
                }
                KeyCode::Backspace => self.input.backspace(),
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
            Some(Stage::Caring(caring)) => match key.code {
                KeyCode::Char('f') => self.bus.publish(Event::Care(CareAction::Feed)),
                KeyCode::Char('t') => self.bus.publish(Event::Care(CareAction::Treat)),
                KeyCode::Char('p') => self.bus.publish(Event::Care(CareAction::Play)),
                KeyCode::Char('c') => {
                    caring.chatting = true;
                    self.input = InputLine::with_limit(CHAT_LIMIT);
                }
                KeyCode::Char('q') | KeyCode::Esc => self.bus.publish(Event::Quit),
                _ => {}
            },
            Some(Stage::Departed(_)) => match key.code {
                KeyCode::Char('n') => self.bus.publish(Event::Reroll),
                KeyCode::Char('q') | KeyCode::Esc => self.bus.publish(Event::Quit),
                _ => {}
            },
            None => {}
        }
    }

    /// Drain the bus and dispatch every queued event in order.
    pub fn pump(&mut self, now: DateTime<Utc>) {
        for event in self.bus.drain() {
            self.dispatch(event, now);
            if self.quit {
                return;
            }
        }
    }

    fn dispatch(&mut self, event: Event, now: DateTime<Utc>) {
        match event {
            Event::Quit => {
                if let Some(Stage::Caring(caring)) = &self.stage {
                    if let Err(err) = caring.session.save() {
                        tracing::warn!(error = %err, "failed to save on quit");
                    }
                }
                tracing::info!("quit requested");
                self.quit = true;
            }
            // The next draw picks up the new size.
            Event::Resize { .. } => {}
            event => {
                let Some(stage) = self.stage.take() else {
                    return;
                };
                self.stage = Some(self.step(stage, event, now));
            }
        }
    }

    fn step(&mut self, stage: Stage, event: Event, now: DateTime<Utc>) -> Stage {
        match (stage, event) {
            (Stage::Adopting(adoption), Event::Reroll) => {
                tracing::debug!("rerolled adoption candidate");
                self.start_adoption(adoption.generator, now)
            }
            (Stage::Adopting(adoption), Event::Adopt { name }) => {
                self.finish_adoption(adoption, &name, now)
            }
            (Stage::Caring(caring), Event::Tick { now: instant }) => {
                self.tick_caring(caring, instant, now)
            }
            (Stage::Caring(caring), Event::Care(action)) => self.care(caring, action, now),
            (Stage::Caring(caring), Event::ChatSubmitted(message)) => {
                self.chat(caring, &message, now)
            }
            (Stage::Departed(departed), Event::Reroll) => {
                self.status = "Meet a pet looking for a home.".to_string();
                self.start_adoption(departed.generator, now)
            }
            (stage, _) => stage,
        }
    }

    fn start_adoption(&mut self, generator: BoxedGenerator, now: DateTime<Utc>) -> Stage {
        self.input.clear();
        Stage::Adopting(Adoption {
            candidate: Pet::candidate(self.store.roster(), &mut self.rng, now),
            naming: false,
            generator,
        })
    }

    fn finish_adoption(&mut self, mut adoption: Adoption, name: &str, now: DateTime<Utc>) -> Stage {
        let result = adopt(
            adoption.candidate.clone(),
            name,
            &mut adoption.generator,
            &self.pipeline,
            &self.store,
            now,
        );
        match result {
            Ok(pet) => {
                self.status = format!("Welcome home, {}!", pet.name);
                self.start_caring(pet, adoption.generator, Instant::now())
            }
            Err(err) => {
                tracing::warn!(error = %err, "adoption failed");
                self.status = format!("Adoption failed: {err}");
                adoption.naming = false;
                Stage::Adopting(adoption)
            }
        }
    }

    fn start_caring(&mut self, pet: Pet, generator: BoxedGenerator, now: Instant) -> Stage {
        self.input.clear();
        let animation = load_animation(&self.pipeline, &pet, self.frame_interval, now);
        Stage::Caring(Caring {
            session: Session::new(pet, self.engine.clone(), self.store.clone(), generator),
            chatting: false,
            animation,
        })
    }

    fn tick_caring(&mut self, mut caring: Caring, instant: Instant, now: DateTime<Utc>) -> Stage {
        if let Some(animation) = caring.animation.as_mut() {
            animation.tick(instant);
        }
        if caring.session.tick(now).is_deceased() {
            return self.depart(caring.session);
        }
        Stage::Caring(caring)
    }

    fn care(&mut self, mut caring: Caring, action: CareAction, now: DateTime<Utc>) -> Stage {
        match caring.session.care(action, now) {
            Ok(state) => {
                self.status = format!(
                    "{action}: health {}, hunger {}",
                    state.health(),
                    state.hunger()
                );
            }
            Err(SessionError::Deceased { .. }) => return self.depart(caring.session),
            Err(err) => {
                tracing::warn!(%action, error = %err, "care action failed");
                self.status = format!("{action} failed: {err}");
                return Stage::Caring(caring);
            }
        }

        if let Err(err) = caring.session.react(action) {
            tracing::warn!(%action, error = %err, "no reaction from the pet");
            self.status.push_str(&format!(" (no reaction: {err})"));
        }
        Stage::Caring(caring)
    }

    fn chat(&mut self, mut caring: Caring, message: &str, now: DateTime<Utc>) -> Stage {
        match caring.session.chat(message, now) {
            Ok(_) => self.status = format!("{} replied.", caring.session.pet().name),
            Err(SessionError::EmptyMessage) => self.status = "Type something first.".to_string(),
            Err(SessionError::Deceased { .. }) => return self.depart(caring.session),
            Err(err) => {
                tracing::warn!(error = %err, "chat failed");
                self.status = format!("No reply: {err}");
            }
        }
        Stage::Caring(caring)
    }

    /// Leave the care screen for good and try to paint a farewell.
    fn depart(&mut self, session: Session<BoxedGenerator>) -> Stage {
        let (pet, mut generator) = session.into_parts();
        tracing::info!(name = %pet.name, "pet has passed away");
        self.input.clear();
        self.status = format!("{} has passed away.", pet.name);

        let (note, portrait) = match self
            .pipeline
            .generate_farewell(&mut generator, &pet.animal_type)
        {
            Ok(path) => (
                format!("A farewell portrait was saved to {}", path.display()),
                load_portrait(&path),
            ),
            Err(err) => {
                tracing::warn!(error = %err, "could not produce a farewell image");
                (format!("No farewell image could be produced: {err}"), None)
            }
        };

        Stage::Departed(Departed {
            pet,
            note,
            portrait,
            generator,
        })
    }

    pub fn draw(&self, f: &mut Frame) {
        let area = f.area();
        match &self.stage {
            Some(Stage::Adopting(adoption)) => {
                let [top, body, help] = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Min(0),
                    Constraint::Length(1),
                ])
                .areas(area);
                render_top_bar(f, top, "Adoption", &self.status);
                render_candidate(f, body, &adoption.candidate, &self.input, adoption.naming);
                let hints = if adoption.naming { NAMING_HINTS } else { ADOPTION_HINTS };
                render_help(f, help, hints);
            }
            Some(Stage::Caring(caring)) => {
                let rects = pet_layout(area, FACE_WIDTH, LOG_HEIGHT);
                let pet = caring.session.pet();
                render_top_bar(f, rects.top, &pet.name, &self.status);
                render_face(
                    f.buffer_mut(),
                    rects.face,
                    caring.animation.as_ref().and_then(Animation::current_frame),
                    &pet.animal_type.to_uppercase(),
                );
                render_vitals(f, rects.vitals, pet);
                render_chat(
                    f,
                    rects.chat,
                    &pet.chat_history,
                    caring.chatting.then_some(&self.input),
                    caring.chatting,
                );
                render_log(f, rects.log, &self.log_buffer.recent(usize::from(rects.log.height)));
                let hints = if caring.chatting { CHAT_HINTS } else { CARE_HINTS };
                render_help(f, rects.help, hints);
            }
            Some(Stage::Departed(departed)) => {
                let rects = pet_layout(area, FACE_WIDTH, LOG_HEIGHT);
                render_top_bar(f, rects.top, &departed.pet.name, &self.status);
                render_face(f.buffer_mut(), rects.face, departed.portrait.as_ref(), "FAREWELL");
                render_farewell(
                    f,
                    rects.vitals.union(rects.chat),
                    &departed.pet,
                    &departed.note,
                );
                render_log(f, rects.log, &self.log_buffer.recent(usize::from(rects.log.height)));
                render_help(f, rects.help, DEPARTED_HINTS);
            }
            None => {}
        }
    }
}

/// Frames of the pet's sheet, or `None` when the sheet or atlas is unusable.
fn load_animation(
    pipeline: &SpritePipeline,
    pet: &Pet,
    interval: Duration,
    now: Instant,
) -> Option<Animation> {
    let number = pet.image_number?;
    let sheet = pipeline.sheet_for(number);
    match load_frames(&sheet, pipeline.atlas_file()) {
        Ok(frames) if !frames.is_empty() => Some(Animation::new(frames, interval, now)),
        Ok(_) => {
            tracing::warn!(sheet = %sheet.display(), "atlas lists no frames for sheet");
            None
        }
        Err(err) => {
            tracing::warn!(sheet = %sheet.display(), error = %err, "could not load pet animation");
            None
        }
    }
}

fn load_portrait(path: &Path) -> Option<SpriteFrame> {
    match image::open(path) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            Some(SpriteFrame {
                data: rgba.into_raw(),
                width,
                height,
            })
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read farewell image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pixelpet_core::adoption::FAREWELL_FILE;
    use pixelpet_remote::OfflineGenerator;
    use ratatui::{backend::TestBackend, Terminal};

    struct Fixture {
        dir: tempfile::TempDir,
        settings: Settings,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.save_file = dir.path().join("save_file.txt");
        settings.paths.atlas_file = dir.path().join("mapping.atlas");
        settings.paths.animations_dir = dir.path().join("anim");
        Fixture { dir, settings }
    }

    fn new_app(fx: &Fixture, now: DateTime<Utc>) -> App {
        App::new(
            &fx.settings,
            Box::new(OfflineGenerator::default()),
            LogBuffer::new(50),
            now,
        )
        .unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn adopted(fx: &Fixture, now: DateTime<Utc>) -> App {
        let mut app = new_app(fx, now);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Kiwi");
        press(&mut app, KeyCode::Enter);
        app.pump(now);
        app
    }

    fn caring(app: &App) -> &Caring {
        match &app.stage {
            Some(Stage::Caring(caring)) => caring,
            _ => panic!("expected the care screen"),
        }
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 36)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().to_string())
            .collect()
    }

    #[test]
    fn starts_in_adoption_without_save() {
        let fx = fixture();
        let app = new_app(&fx, Utc::now());
        assert!(matches!(app.stage, Some(Stage::Adopting(_))));
        assert!(screen(&app).contains("ADOPT A PET"));
    }

    #[test]
    fn naming_and_confirming_adopts() {
        let fx = fixture();
        let app = adopted(&fx, Utc::now());

        let caring = caring(&app);
        assert_eq!(caring.session.pet().name, "Kiwi");
        assert_eq!(caring.session.pet().image_number, Some(1));
        assert_eq!(caring.animation.as_ref().map(Animation::len), Some(6));
        assert!(fx.settings.paths.save_file.exists());
        assert!(app.status.contains("Welcome home, Kiwi"));
    }

    #[test]
    fn letters_while_naming_are_text() {
        let fx = fixture();
        let mut app = new_app(&fx, Utc::now());
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "qr");
        app.pump(Utc::now());
        assert!(!app.should_quit());
        assert_eq!(app.input.as_str(), "qr");
    }

    #[test]
    fn reroll_keeps_browsing() {
        let fx = fixture();
        let mut app = new_app(&fx, Utc::now());
        press(&mut app, KeyCode::Char('r'));
        app.pump(Utc::now());
        assert!(matches!(
            app.stage,
            Some(Stage::Adopting(Adoption { naming: false, .. }))
        ));
        assert!(!fx.settings.paths.save_file.exists());
    }

    #[test]
    fn feeding_records_a_reaction() {
        let fx = fixture();
        let now = Utc::now();
        let mut app = adopted(&fx, now);

        press(&mut app, KeyCode::Char('f'));
        app.pump(now);

        let pet = caring(&app).session.pet();
        assert_eq!(pet.state.hunger(), 0);
        assert!(pet.chat_history.contains("Your pet reacted:"));
        assert!(app.status.starts_with("Feed: health 100, hunger 0"));
    }

    #[test]
    fn chat_round_trip() {
        let fx = fixture();
        let now = Utc::now();
        let mut app = adopted(&fx, now);

        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "hi there");
        press(&mut app, KeyCode::Enter);
        app.pump(now);

        let caring = caring(&app);
        assert!(caring.chatting);
        assert!(caring.session.pet().chat_history.contains("You: hi there\nPet: "));
        assert!(app.status.contains("Kiwi replied"));
    }

    #[test]
    fn blank_chat_is_refused() {
        let fx = fixture();
        let now = Utc::now();
        let mut app = adopted(&fx, now);

        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Enter);
        app.pump(now);

        assert!(caring(&app).session.pet().chat_history.is_empty());
        assert_eq!(app.status, "Type something first.");
    }

    #[test]
    fn starvation_ends_in_farewell() {
        let fx = fixture();
        let now = Utc::now();
        let mut app = adopted(&fx, now);

        app.publish(Event::Tick {
            now: Instant::now(),
        });
        app.pump(now + TimeDelta::hours(49));

        match &app.stage {
            Some(Stage::Departed(departed)) => {
                assert!(departed.pet.state.is_deceased());
                assert!(departed.portrait.is_some());
                assert!(departed.note.contains(FAREWELL_FILE));
            }
            _ => panic!("expected the farewell screen"),
        }
        assert!(fx.settings.paths.animations_dir.join(FAREWELL_FILE).exists());
        assert!(screen(&app).contains("has passed away"));

        // Care keys do nothing any more; a new pet can be adopted.
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('n'));
        app.pump(now + TimeDelta::hours(49));
        assert!(matches!(app.stage, Some(Stage::Adopting(_))));
    }

    #[test]
    fn quit_saves_and_stops() {
        let fx = fixture();
        let now = Utc::now();
        let mut app = adopted(&fx, now);
        std::fs::remove_file(&fx.settings.paths.save_file).unwrap();

        press(&mut app, KeyCode::Char('q'));
        app.pump(now);

        assert!(app.should_quit());
        assert!(fx.settings.paths.save_file.exists());
    }

    #[test]
    fn resumes_saved_pet() {
        let fx = fixture();
        let now = Utc::now();
        drop(adopted(&fx, now));

        let app = new_app(&fx, now);
        assert_eq!(caring(&app).session.pet().name, "Kiwi");
        let text = screen(&app);
        assert!(text.contains("Welcome back, Kiwi!"));
        assert!(text.contains("VITALS"));
    }

    #[test]
    fn corrupt_save_starts_adoption() {
        let fx = fixture();
        std::fs::write(&fx.settings.paths.save_file, "{ not json").unwrap();
        let app = new_app(&fx, Utc::now());
        assert!(matches!(app.stage, Some(Stage::Adopting(_))));
        assert!(fx.dir.path().join("save_file.txt").exists());
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let fx = fixture();
        let mut app = new_app(&fx, Utc::now());
        press(&mut app, KeyCode::Char('a'));
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        app.pump(Utc::now());
        assert!(app.should_quit());
    }
}
