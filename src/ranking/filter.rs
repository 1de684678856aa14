use crate::cast::RawCast;

/// Drops casts with no text or whitespace-only text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFilter;

impl TextFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn keep(&self, cast: &RawCast) -> bool {
        cast.has_text()
    }

    /// Keeps passing casts in input order and returns how many were dropped.
    pub fn apply(&self, casts: Vec<RawCast>) -> (Vec<RawCast>, usize) {
        let before = casts.len();
        let kept: Vec<RawCast> = casts.into_iter().filter(|cast| self.keep(cast)).collect();
        let dropped = before - kept.len();
        (kept, dropped)
    }
}
