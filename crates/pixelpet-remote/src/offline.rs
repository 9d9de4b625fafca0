use pixelpet_core::error::GenerationError;
use pixelpet_core::generate::Generator;
use pixelpet_core::lifecycle::CareAction;
use pixelpet_sprite::painter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const FEED_REPLIES: &[&str] = &[
    "Nom nom! That hit the spot.",
    "Crunchy! More tomorrow, please.",
    "Finally, someone remembered dinner.",
];

const TREAT_REPLIES: &[&str] = &[
    "Ouch! ...but I do feel better.",
    "I was very brave about that needle.",
    "Medicine tastes weird. Thanks anyway.",
];

const PLAY_REPLIES: &[&str] = &[
    "Again! Again!",
    "I win! Best two out of three?",
    "That was the most fun all day.",
];

const CHAT_REPLIES: &[&str] = &[
    "I'm listening. Tell me more!",
    "Hmm, I was just thinking about snacks.",
    "You're my favourite human.",
    "Did you know I can count to six? One, two, ... six!",
];

/// Local stand-in for a generative backend.
///
/// Replies come from small canned lists chosen by the care action named in
/// the prompt. Images are painted procedurally: a six-frame face sheet, or a
/// grey farewell picture when the prompt asks for a dead pet.
pub struct OfflineGenerator {
    rng: StdRng,
    sheets_painted: u64,
}

impl Default for OfflineGenerator {
    fn default() -> Self {
        Self::with_seed(0x5eed)
    }
}

impl OfflineGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sheets_painted: seed,
        }
    }

    fn replies_for(prompt: &str) -> &'static [&'static str] {
        let action = CareAction::ALL
            .into_iter()
            .find(|action| prompt.contains(action.owner_phrase()));
        match action {
            Some(CareAction::Feed) => FEED_REPLIES,
            Some(CareAction::Treat) => TREAT_REPLIES,
            Some(CareAction::Play) => PLAY_REPLIES,
            None => CHAT_REPLIES,
        }
    }
}

impl Generator for OfflineGenerator {
    fn generate_text(&mut self, prompt: &str) -> Result<String, GenerationError> {
        Self::replies_for(prompt)
            .choose(&mut self.rng)
            .map(|reply| reply.to_string())
            .ok_or(GenerationError::EmptyText)
    }

    fn generate_image(&mut self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let img = if prompt.contains("dead") {
            painter::paint_farewell()
        } else {
            self.sheets_painted += 1;
            painter::paint_sheet(self.sheets_painted)
        };
        painter::encode_png(&img).map_err(|err| GenerationError::Backend(err.to_string()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
