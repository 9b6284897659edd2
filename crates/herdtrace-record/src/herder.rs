use std::fmt;

use serde::{Deserialize, Serialize};

/// Who controls a herder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Role {
    Human,
    ArtificialAgent,
}

impl Role {
    /// Column prefix used for herders of this role in recordings.
    #[must_use]
    pub const fn column_prefix(self) -> &'static str {
        match self {
            Role::Human => "p",
            Role::ArtificialAgent => "hA",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => f.write_str("Human"),
            Role::ArtificialAgent => f.write_str("Artificial"),
        }
    }
}

/// One of the two herder positions in a session.
///
/// Player slots are fixed across trials: each slot starts every trial from the
/// same predetermined location, so slot-matched trajectories are comparable
/// between sessions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::IsVariant,
)]
pub enum PlayerSlot {
    First,
    Second,
}

impl PlayerSlot {
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::First, PlayerSlot::Second];

    /// Zero-based slot index, as used in column names.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            PlayerSlot::First => 0,
            PlayerSlot::Second => 1,
        }
    }

    /// One-based player number, as written in score tables.
    #[must_use]
    pub const fn number(self) -> usize {
        self.index() + 1
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerSlot::First),
            1 => Some(PlayerSlot::Second),
            _ => None,
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            PlayerSlot::First => PlayerSlot::Second,
            PlayerSlot::Second => PlayerSlot::First,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A herder identified by role and per-role index, e.g. `p1` or `hA0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Herder {
    pub role: Role,
    pub index: u8,
}

impl Herder {
    #[must_use]
    pub const fn new(role: Role, index: u8) -> Self {
        Self { role, index }
    }

    /// Column prefix of this herder, e.g. `"p0"` for the first human.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}{}", self.role.column_prefix(), self.index)
    }
}

impl fmt::Display for Herder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

/// Composition of a session, which fixes the herder in each player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pairing {
    /// Two humans: `p0`, `p1`.
    HumanHuman,
    /// A human and an artificial agent: `p0`, `hA0`.
    ///
    /// Which player slot the human occupied is a property of the session
    /// (see [`Session::human_player`](crate::Session::human_player)); within
    /// the recording the human is always listed first.
    HumanAa,
    /// Two artificial agents (simulation): `hA0`, `hA1`.
    AaAa,
}

impl Pairing {
    /// Herder recorded in the given slot of a file.
    #[must_use]
    pub const fn herder(self, slot: PlayerSlot) -> Herder {
        match (self, slot) {
            (Pairing::HumanHuman, PlayerSlot::First) => Herder::new(Role::Human, 0),
            (Pairing::HumanHuman, PlayerSlot::Second) => Herder::new(Role::Human, 1),
            (Pairing::HumanAa, PlayerSlot::First) => Herder::new(Role::Human, 0),
            (Pairing::HumanAa, PlayerSlot::Second) => Herder::new(Role::ArtificialAgent, 0),
            (Pairing::AaAa, PlayerSlot::First) => Herder::new(Role::ArtificialAgent, 0),
            (Pairing::AaAa, PlayerSlot::Second) => Herder::new(Role::ArtificialAgent, 1),
        }
    }

    #[must_use]
    pub fn herders(self) -> [Herder; 2] {
        PlayerSlot::ALL.map(|slot| self.herder(slot))
    }

    /// Recording slot holding the herder with `role`, if the pairing has one.
    #[must_use]
    pub fn slot_of(self, role: Role) -> Option<PlayerSlot> {
        PlayerSlot::ALL
            .into_iter()
            .find(|&slot| self.herder(slot).role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(
            Pairing::HumanHuman.herders().map(|h| h.prefix()),
            ["p0".to_owned(), "p1".to_owned()]
        );
        assert_eq!(
            Pairing::HumanAa.herders().map(|h| h.prefix()),
            ["p0".to_owned(), "hA0".to_owned()]
        );
        assert_eq!(
            Pairing::AaAa.herders().map(|h| h.prefix()),
            ["hA0".to_owned(), "hA1".to_owned()]
        );
    }

    #[test]
    fn test_slot_of() {
        assert_eq!(Pairing::HumanAa.slot_of(Role::Human), Some(PlayerSlot::First));
        assert_eq!(
            Pairing::HumanAa.slot_of(Role::ArtificialAgent),
            Some(PlayerSlot::Second)
        );
        assert_eq!(Pairing::AaAa.slot_of(Role::Human), None);
    }

    #[test]
    fn test_player_slot() {
        assert_eq!(PlayerSlot::First.other(), PlayerSlot::Second);
        assert_eq!(PlayerSlot::Second.to_string(), "2");
        assert_eq!(PlayerSlot::from_index(1), Some(PlayerSlot::Second));
        assert_eq!(PlayerSlot::from_index(2), None);
    }
}
