/// Allegiance used for target selection.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Faction {
    Player,
    /// Followers and friendly survivors.
    Ally,
    Neutral,
    Bandit,
    Zombie,
    /// Animals; hostile to nobody unless provoked.
    Wildlife,
}

impl Faction {
    pub const fn is_hostile_to(self, other: Faction) -> bool {
        use Faction::*;
        matches!(
            (self, other),
            (Zombie, Player | Ally | Neutral | Bandit)
                | (Bandit, Player | Ally | Neutral | Zombie)
                | (Player | Ally, Zombie | Bandit)
                | (Neutral, Zombie | Bandit)
        )
    }

    pub const fn is_friendly_to_player(self) -> bool {
        matches!(self, Faction::Player | Faction::Ally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn hostility_is_symmetric() {
        for a in Faction::iter() {
            for b in Faction::iter() {
                assert_eq!(a.is_hostile_to(b), b.is_hostile_to(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn wildlife_is_left_alone() {
        assert!(Faction::iter().all(|f| !f.is_hostile_to(Faction::Wildlife)));
        assert!(Faction::Zombie.is_hostile_to(Faction::Player));
        assert!(!Faction::Ally.is_hostile_to(Faction::Player));
    }
}
