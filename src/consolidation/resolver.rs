//! Shadow conflict resolution.
//!
//! A legacy page name and its canonical identifier can both exist in the
//! store at once. Something has to decide which text survives the merge.

/// Which side of a shadow conflict survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictWinner {
    Legacy,
    Canonical,
}

/// Policy for choosing between a legacy page and the canonical page that
/// shadows it.
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, legacy: &[u8], canonical: &[u8]) -> ConflictWinner;
}

/// Keeps whichever text is strictly longer; ties keep the canonical page.
pub struct LongerTextWins;

impl ConflictResolver for LongerTextWins {
    fn resolve(&self, legacy: &[u8], canonical: &[u8]) -> ConflictWinner {
        if legacy.len() > canonical.len() {
            ConflictWinner::Legacy
        } else {
            ConflictWinner::Canonical
        }
    }
}
