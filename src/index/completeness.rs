//! Staged completeness milestones of one index.
//!
//! An index moves through its stages in one direction only:
//!
//! ```text
//! Building -> DefinitionsSeeded -> StaticComplete -> Complete
//! ```
//!
//! The stage is a single atomic byte raised with `fetch_max`, so the three
//! milestone flags are derived from one value and a reader can never observe
//! `complete` without `static_complete`. Marking a later milestone implies the
//! earlier ones; marking a reached milestone again is a no-op.

use std::sync::atomic::{AtomicU8, Ordering};

/// How far an index has been populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    Building = 0,
    DefinitionsSeeded = 1,
    StaticComplete = 2,
    Complete = 3,
}

impl Stage {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Stage::Building,
            1 => Stage::DefinitionsSeeded,
            2 => Stage::StaticComplete,
            _ => Stage::Complete,
        }
    }

    /// The stages strictly after `self` up to and including `target`.
    fn range_to(self, target: Stage) -> impl Iterator<Item = Stage> {
        (self as u8 + 1..=target as u8).map(Stage::from_raw)
    }
}

/// Atomic milestone state for one index.
#[derive(Debug, Default)]
pub struct Completeness {
    stage: AtomicU8,
}

impl Completeness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        Stage::from_raw(self.stage.load(Ordering::Acquire))
    }

    pub fn is_definitions_seeded(&self) -> bool {
        self.stage() >= Stage::DefinitionsSeeded
    }

    pub fn is_static_complete(&self) -> bool {
        self.stage() >= Stage::StaticComplete
    }

    pub fn is_complete(&self) -> bool {
        self.stage() == Stage::Complete
    }

    /// Raise the stage to at least `target`.
    ///
    /// Returns the milestones newly reached by this call, in order. Empty when
    /// `target` had already been reached.
    pub fn advance(&self, target: Stage) -> Vec<Stage> {
        let previous = Stage::from_raw(self.stage.fetch_max(target as u8, Ordering::AcqRel));
        if previous >= target {
            return Vec::new();
        }
        previous.range_to(target).collect()
    }

    pub fn seed_definitions(&self) -> Vec<Stage> {
        self.advance(Stage::DefinitionsSeeded)
    }

    pub fn mark_static_complete(&self) -> Vec<Stage> {
        self.advance(Stage::StaticComplete)
    }

    pub fn mark_complete(&self) -> Vec<Stage> {
        self.advance(Stage::Complete)
    }

    /// Return to `Building`. Returns the stage that was left.
    pub fn reset(&self) -> Stage {
        Stage::from_raw(self.stage.swap(Stage::Building as u8, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_building() {
        let c = Completeness::new();
        assert_eq!(c.stage(), Stage::Building);
        assert!(!c.is_definitions_seeded());
        assert!(!c.is_static_complete());
        assert!(!c.is_complete());
    }

    #[test]
    fn test_linear_progress() {
        let c = Completeness::new();

        assert_eq!(c.seed_definitions(), vec![Stage::DefinitionsSeeded]);
        assert_eq!(c.mark_static_complete(), vec![Stage::StaticComplete]);
        assert!(c.is_static_complete());
        assert!(!c.is_complete());
        assert_eq!(c.mark_complete(), vec![Stage::Complete]);
        assert!(c.is_complete());
    }

    #[test]
    fn test_marks_are_idempotent() {
        let c = Completeness::new();
        c.mark_static_complete();

        assert!(c.mark_static_complete().is_empty());
        assert!(c.is_static_complete());

        c.mark_complete();
        assert!(c.mark_complete().is_empty());
        assert!(c.mark_static_complete().is_empty());
        assert!(c.seed_definitions().is_empty());
        assert!(c.is_complete());
    }

    #[test]
    fn test_complete_implies_static() {
        let c = Completeness::new();

        assert_eq!(
            c.mark_complete(),
            vec![Stage::DefinitionsSeeded, Stage::StaticComplete, Stage::Complete]
        );
        assert!(c.is_static_complete());
        assert!(c.is_definitions_seeded());
    }

    #[test]
    fn test_reset() {
        let c = Completeness::new();
        c.mark_complete();

        assert_eq!(c.reset(), Stage::Complete);
        assert!(!c.is_complete());
        assert!(!c.is_static_complete());
        assert_eq!(c.mark_static_complete().len(), 2);
    }
}
