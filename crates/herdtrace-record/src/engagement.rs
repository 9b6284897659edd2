//! Engagement signal derivation
//!
//! A recording flags, per timestep, which targets are currently being run
//! (`t{j}run`). This module turns those flags into the per-herder engagement
//! signal:
//!
//! 1. **Chase flags** ([`chase_flags`]): every running target is attributed to
//!    the herder closest to it, giving each herder a flag per target.
//! 2. **Collapse** ([`collapse`]): a herder's flags reduce to one label. No flag
//!    is [`Engagement::Idle`]; several flags resolve to the target nearest to
//!    the herder, whether it is flagged or not.
//!
//! Both steps are pure functions of a single timestep.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

/// Maximum number of targets in a trial.
pub const MAX_TARGETS: usize = 5;

/// One flag per target of a trial.
pub type TargetFlags = ArrayVec<bool, MAX_TARGETS>;

/// Planar position on the field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub z: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    #[must_use]
    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

/// Which target a herder is pursuing at one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum Engagement {
    Idle,
    Target(u8),
}

impl Engagement {
    /// Numeric label: the target index, or `-1` when idle.
    #[must_use]
    pub fn label(self) -> i32 {
        match self {
            Engagement::Idle => -1,
            Engagement::Target(t) => i32::from(t),
        }
    }

    /// Parses a numeric label; negative values are idle.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_label(label: f64) -> Option<Self> {
        if !label.is_finite() || label.fract() != 0.0 {
            return None;
        }
        if label < 0.0 {
            return Some(Engagement::Idle);
        }
        (label < MAX_TARGETS as f64).then_some(Engagement::Target(label as u8))
    }
}

/// Snapshot of one timestep used for engagement derivation.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Running flag per target.
    pub running: &'a [bool],
    /// Position per target, same length as `running`.
    pub targets: &'a [Position],
    /// Herder positions, indexed by player slot.
    pub herders: [Position; 2],
}

/// Attributes every running target to its closest herder.
///
/// Ties go to the first player slot.
#[must_use]
pub fn chase_flags(frame: &Frame<'_>) -> [TargetFlags; 2] {
    debug_assert_eq!(frame.running.len(), frame.targets.len());
    let mut flags = [TargetFlags::new(), TargetFlags::new()];
    for (&running, target) in frame.running.iter().zip(frame.targets) {
        let chaser = if frame.herders[1].distance(target) < frame.herders[0].distance(target) {
            1
        } else {
            0
        };
        for (slot, slot_flags) in flags.iter_mut().enumerate() {
            slot_flags.push(running && slot == chaser);
        }
    }
    flags
}

/// Collapses a herder's per-target flags into a single engagement label.
///
/// No flag is idle and a single flag is that target. When more than one
/// target is flagged, the label is the target nearest to `herder` among all
/// targets of the trial, flagged or not (lowest index on ties).
///
/// # Panics
///
/// Panics if `flags` and `targets` differ in length.
#[expect(clippy::cast_possible_truncation)]
#[must_use]
pub fn collapse(flags: &[bool], herder: Position, targets: &[Position]) -> Engagement {
    assert_eq!(flags.len(), targets.len());
    let mut flagged = flags.iter().enumerate().filter(|(_, flag)| **flag);
    let target = match (flagged.next(), flagged.next()) {
        (None, _) => return Engagement::Idle,
        (Some((idx, _)), None) => idx,
        (Some(_), Some(_)) => nearest_target(herder, targets),
    };
    Engagement::Target(target as u8)
}

/// Index of the target closest to `herder`; the first one wins ties.
fn nearest_target(herder: Position, targets: &[Position]) -> usize {
    targets
        .iter()
        .map(|target| herder.distance(target))
        .enumerate()
        .fold((0, f64::INFINITY), |best, (idx, distance)| {
            if distance < best.1 { (idx, distance) } else { best }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> [Position; 3] {
        [
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(-10.0, 0.0),
        ]
    }

    #[test]
    fn test_no_flags_is_idle() {
        let engagement = collapse(&[false; 3], Position::new(1.0, 1.0), &targets());
        assert_eq!(engagement, Engagement::Idle);
        assert_eq!(engagement.label(), -1);
    }

    #[test]
    fn test_single_flag_wins_regardless_of_distance() {
        let engagement = collapse(&[false, false, true], Position::new(9.0, 0.0), &targets());
        assert_eq!(engagement, Engagement::Target(2));
    }

    #[test]
    fn test_multiple_flags_resolve_to_nearest_of_all_targets() {
        // Target 0 is not flagged but is the nearest target overall.
        let engagement = collapse(&[false, true, true], Position::new(1.0, 0.0), &targets());
        assert_eq!(engagement, Engagement::Target(0));

        let engagement = collapse(&[true, true, false], Position::new(-9.0, 0.0), &targets());
        assert_eq!(engagement, Engagement::Target(2));
    }

    #[test]
    fn test_equidistant_targets_pick_lowest_index() {
        let targets = [
            Position::new(5.0, 0.0),
            Position::new(-5.0, 0.0),
            Position::new(0.0, 5.0),
        ];
        let engagement = collapse(&[false, true, true], Position::new(0.0, 0.0), &targets);
        assert_eq!(engagement, Engagement::Target(0));
    }

    #[test]
    fn test_chase_flags_assign_nearest_herder() {
        let targets = targets();
        let frame = Frame {
            running: &[true, true, false],
            targets: &targets,
            herders: [Position::new(-8.0, 0.0), Position::new(8.0, 0.0)],
        };
        let [first, second] = chase_flags(&frame);
        // Target 0 is equidistant and goes to the first slot.
        assert_eq!(first.as_slice(), &[true, false, false]);
        assert_eq!(second.as_slice(), &[false, true, false]);
    }

    #[test]
    fn test_label_round_trip_rejects_garbage() {
        assert_eq!(Engagement::from_label(-1.0), Some(Engagement::Idle));
        assert_eq!(Engagement::from_label(3.0), Some(Engagement::Target(3)));
        assert_eq!(Engagement::from_label(5.0), None);
        assert_eq!(Engagement::from_label(1.5), None);
        assert_eq!(Engagement::from_label(f64::NAN), None);
    }
}
