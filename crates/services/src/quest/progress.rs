use super::session::QuestSession;

/// Aggregated view of quest progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestProgress {
    pub turn: u32,
    pub score: u32,
    /// Backend-reported progress as a whole percentage.
    pub percent: Option<u8>,
    pub is_finished: bool,
}

impl QuestProgress {
    #[must_use]
    pub fn of(session: &QuestSession) -> Self {
        let scene = session.scene();
        let percent = if scene.is_finished() {
            Some(100)
        } else {
            scene.progress().map(percent_of)
        };
        Self {
            turn: session.turn(),
            score: scene.score(),
            percent,
            is_finished: scene.is_finished(),
        }
    }
}

/// `fraction` is expected in `[0, 1]`.
#[must_use]
pub fn percent_of(fraction: f32) -> u8 {
    // Clamped, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
    percent
}
