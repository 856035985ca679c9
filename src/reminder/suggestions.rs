//! Catalog of break activities shown on the overlay

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Eyes,
    Stretch,
    Movement,
    Relaxation,
}

/// One break activity: an icon name plus a short title and instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakSuggestion {
    pub kind: SuggestionKind,
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const fn suggestion(
    kind: SuggestionKind,
    icon: &'static str,
    title: &'static str,
    description: &'static str,
) -> BreakSuggestion {
    BreakSuggestion { kind, icon, title, description }
}

pub const BREAK_SUGGESTIONS: [BreakSuggestion; 12] = [
    suggestion(SuggestionKind::Eyes, "eye", "20-20-20 Rule", "Look at something 20 feet away for 20 seconds"),
    suggestion(SuggestionKind::Eyes, "eyes", "Blink Exercise", "Blink rapidly 20 times to refresh your eyes"),
    suggestion(SuggestionKind::Eyes, "circle.dashed", "Eye Circles", "Roll your eyes in circles, 5 times each direction"),
    suggestion(SuggestionKind::Stretch, "figure.arms.open", "Shoulder Stretch", "Roll your shoulders backward 10 times"),
    suggestion(SuggestionKind::Stretch, "figure.stand", "Stand & Stretch", "Stand up, reach for the ceiling and hold"),
    suggestion(SuggestionKind::Stretch, "arrow.left.arrow.right", "Neck Stretch", "Tilt your head to each side, hold for 10 seconds"),
    suggestion(SuggestionKind::Stretch, "hands.clap", "Wrist Circles", "Rotate your wrists 10 times each direction"),
    suggestion(SuggestionKind::Movement, "figure.walk", "Take a Walk", "Walk around for 2-3 minutes"),
    suggestion(SuggestionKind::Movement, "figure.stairs", "Climb Stairs", "Walk up and down stairs if available"),
    suggestion(SuggestionKind::Relaxation, "wind", "Deep Breathing", "Take 5 deep breaths: 4s in, 4s hold, 4s out"),
    suggestion(SuggestionKind::Relaxation, "drop", "Hydrate", "Drink a glass of water"),
    suggestion(SuggestionKind::Relaxation, "sun.max", "Get Natural Light", "Look out a window or step outside briefly"),
];

/// Draw one suggestion uniformly from the catalog
pub fn random_suggestion<R: Rng + ?Sized>(rng: &mut R) -> BreakSuggestion {
    *BREAK_SUGGESTIONS.choose(rng).unwrap_or(&BREAK_SUGGESTIONS[0])
}
