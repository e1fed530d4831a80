//! Ownership of every active actor.
//!
//! Non-player actors live in a generational arena: an [`ActorId`] taken
//! before a removal can never alias the actor that reuses its slot. The
//! registry keeps a tile-occupancy index and per-faction buckets next to the
//! arena, and all position changes go through [`ActorRegistry::relocate`]
//! so the three never disagree.
use std::collections::{BTreeMap, HashMap};

use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::actor::{Actor, ActorCore, ActorKind, Creature, Faction, Player};
use crate::error::{ErrorSeverity, SimError};
use crate::state::{Point, Tripoint};
use crate::window::Remap;

new_key_type! {
    /// Generation-checked handle to an active non-player actor.
    pub struct ActorId;
}

/// Something standing on a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    Player,
    Actor(ActorId),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("actor {0:?} is not registered")]
    UnknownActor(ActorId),

    #[error("tile {at} is occupied by {by:?}")]
    TileOccupied { at: Tripoint, by: Occupant },
}

impl SimError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownActor(_) => ErrorSeverity::Validation,
            Self::TileOccupied { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownActor(_) => "REGISTRY_UNKNOWN_ACTOR",
            Self::TileOccupied { .. } => "REGISTRY_TILE_OCCUPIED",
        }
    }
}

/// Cached per-actor facts other actors plan against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub pos: Tripoint,
    pub faction: Faction,
    pub kind: ActorKind,
    pub dead: bool,
}

impl RosterEntry {
    fn of(creature: &Creature) -> Self {
        let core = creature.core();
        Self {
            pos: core.pos,
            faction: core.faction,
            kind: creature.kind(),
            dead: core.dead,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Roster {
    entries: SecondaryMap<ActorId, RosterEntry>,
    occupancy: HashMap<Tripoint, Occupant>,
}

/// Active actors bucketed by faction, rebuilt lazily.
#[derive(Clone, Debug, Default)]
pub struct FactionGroups {
    buckets: BTreeMap<Faction, Vec<Occupant>>,
    dirty: bool,
}

impl FactionGroups {
    pub fn members(&self, faction: Faction) -> &[Occupant] {
        self.buckets.get(&faction).map_or(&[], Vec::as_slice)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Read-only slice of the registry handed to planning actors.
#[derive(Clone, Copy)]
pub struct RosterView<'a> {
    roster: &'a Roster,
    groups: &'a FactionGroups,
    player: &'a ActorCore,
}

impl<'a> RosterView<'a> {
    pub fn player_pos(&self) -> Tripoint {
        self.player.pos
    }

    pub fn entry(&self, id: ActorId) -> Option<&'a RosterEntry> {
        self.roster.entries.get(id)
    }

    pub fn position_of(&self, occupant: Occupant) -> Option<Tripoint> {
        match occupant {
            Occupant::Player => Some(self.player.pos),
            Occupant::Actor(id) => self.roster.entries.get(id).filter(|e| !e.dead).map(|e| e.pos),
        }
    }

    pub fn occupant_at(&self, pos: Tripoint) -> Option<Occupant> {
        self.roster.occupancy.get(&pos).copied()
    }

    pub fn is_free(&self, pos: Tripoint) -> bool {
        !self.roster.occupancy.contains_key(&pos)
    }

    /// Living members of every faction hostile to `faction`, with positions.
    pub fn hostiles_of(self, faction: Faction) -> impl Iterator<Item = (Occupant, Tripoint)> + 'a {
        self.groups
            .buckets
            .iter()
            .filter(move |(other, _)| faction.is_hostile_to(**other))
            .flat_map(|(_, members)| members.iter().copied())
            .filter_map(move |occupant| self.position_of(occupant).map(|pos| (occupant, pos)))
    }
}

/// Owner of the player and every active NPC and monster.
#[derive(Clone, Debug)]
pub struct ActorRegistry {
    player: Player,
    actors: SlotMap<ActorId, Creature>,
    /// Turn order: insertion order of the live actors.
    order: Vec<ActorId>,
    roster: Roster,
    groups: FactionGroups,
}

impl ActorRegistry {
    pub fn new(player: Player) -> Self {
        let mut roster = Roster::default();
        roster.occupancy.insert(player.core.pos, Occupant::Player);
        Self {
            player,
            actors: SlotMap::with_key(),
            order: Vec::new(),
            roster,
            groups: FactionGroups {
                buckets: BTreeMap::new(),
                dirty: true,
            },
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player access. Position changes must use [`Self::relocate`].
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Number of active non-player actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(id)
    }

    pub fn get(&self, id: ActorId) -> Option<&Creature> {
        self.actors.get(id)
    }

    /// Mutable actor access. Position changes must use [`Self::relocate`].
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Creature> {
        self.actors.get_mut(id)
    }

    /// Actor ids in turn order.
    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.order.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Creature)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.actors.get(id).map(|creature| (id, creature)))
    }

    pub fn view(&self) -> RosterView<'_> {
        RosterView {
            roster: &self.roster,
            groups: &self.groups,
            player: &self.player.core,
        }
    }

    /// Splits out one actor mutably alongside a read-only view of the rest.
    pub fn split_for_plan(&mut self, id: ActorId) -> Option<(&mut Creature, RosterView<'_>)> {
        let creature = self.actors.get_mut(id)?;
        let view = RosterView {
            roster: &self.roster,
            groups: &self.groups,
            player: &self.player.core,
        };
        Some((creature, view))
    }

    pub fn occupant_at(&self, pos: Tripoint) -> Option<Occupant> {
        self.roster.occupancy.get(&pos).copied()
    }

    pub fn is_free(&self, pos: Tripoint) -> bool {
        !self.roster.occupancy.contains_key(&pos)
    }

    pub fn position_of(&self, occupant: Occupant) -> Option<Tripoint> {
        self.view().position_of(occupant)
    }

    pub fn core_of(&self, occupant: Occupant) -> Option<&ActorCore> {
        match occupant {
            Occupant::Player => Some(&self.player.core),
            Occupant::Actor(id) => self.actors.get(id).map(Actor::core),
        }
    }

    pub fn core_of_mut(&mut self, occupant: Occupant) -> Option<&mut ActorCore> {
        match occupant {
            Occupant::Player => Some(&mut self.player.core),
            Occupant::Actor(id) => self.actors.get_mut(id).map(Actor::core_mut),
        }
    }

    /// Registers an actor at its current position.
    pub fn insert(&mut self, creature: Creature) -> Result<ActorId, RegistryError> {
        let pos = creature.core().pos;
        if let Some(by) = self.occupant_at(pos) {
            return Err(RegistryError::TileOccupied { at: pos, by });
        }
        let entry = RosterEntry::of(&creature);
        let dead = entry.dead;
        let id = self.actors.insert(creature);
        self.order.push(id);
        self.roster.entries.insert(id, entry);
        if !dead {
            self.roster.occupancy.insert(pos, Occupant::Actor(id));
        }
        self.groups.dirty = true;
        Ok(id)
    }

    pub fn remove(&mut self, id: ActorId) -> Option<Creature> {
        let creature = self.actors.remove(id)?;
        self.order.retain(|&other| other != id);
        if let Some(entry) = self.roster.entries.remove(id)
            && self.roster.occupancy.get(&entry.pos) == Some(&Occupant::Actor(id))
        {
            self.roster.occupancy.remove(&entry.pos);
        }
        self.groups.dirty = true;
        Some(creature)
    }

    /// Moves an actor (or the player) to `dest`.
    pub fn relocate(&mut self, occupant: Occupant, dest: Tripoint) -> Result<(), RegistryError> {
        match self.occupant_at(dest) {
            Some(by) if by != occupant => return Err(RegistryError::TileOccupied { at: dest, by }),
            _ => {}
        }
        let from = match occupant {
            Occupant::Player => {
                let from = self.player.core.pos;
                self.player.core.pos = dest;
                from
            }
            Occupant::Actor(id) => {
                let creature = self.actors.get_mut(id).ok_or(RegistryError::UnknownActor(id))?;
                let core = creature.core_mut();
                let from = core.pos;
                core.pos = dest;
                if let Some(entry) = self.roster.entries.get_mut(id) {
                    entry.pos = dest;
                }
                from
            }
        };
        if self.roster.occupancy.get(&from) == Some(&occupant) {
            self.roster.occupancy.remove(&from);
        }
        self.roster.occupancy.insert(dest, occupant);
        Ok(())
    }

    /// Flags an actor dead and frees its tile; it is removed by [`Self::sweep_dead`].
    pub fn mark_dead(&mut self, id: ActorId) {
        let Some(creature) = self.actors.get_mut(id) else {
            return;
        };
        let core = creature.core_mut();
        core.dead = true;
        let pos = core.pos;
        if let Some(entry) = self.roster.entries.get_mut(id) {
            entry.dead = true;
        }
        if self.roster.occupancy.get(&pos) == Some(&Occupant::Actor(id)) {
            self.roster.occupancy.remove(&pos);
        }
        self.groups.dirty = true;
    }

    /// Removes every actor flagged dead.
    pub fn sweep_dead(&mut self) -> Vec<(ActorId, Creature)> {
        let dead: Vec<ActorId> = self
            .iter()
            .filter(|(_, creature)| creature.is_dead())
            .map(|(id, _)| id)
            .collect();
        dead.into_iter()
            .filter_map(|id| self.remove(id).map(|creature| (id, creature)))
            .collect()
    }

    /// Removes and returns every actor matching `predicate`, in turn order.
    pub fn extract_if(&mut self, mut predicate: impl FnMut(&Creature) -> bool) -> Vec<Creature> {
        let matching: Vec<ActorId> = self
            .iter()
            .filter(|(_, creature)| predicate(creature))
            .map(|(id, _)| id)
            .collect();
        matching.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Removes every non-player actor.
    pub fn drain(&mut self) -> Vec<Creature> {
        self.extract_if(|_| true)
    }

    pub fn groups(&self) -> &FactionGroups {
        &self.groups
    }

    pub fn mark_groups_dirty(&mut self) {
        self.groups.dirty = true;
    }

    /// Rebuilds the faction buckets if anything changed since the last build.
    pub fn refresh_groups(&mut self) {
        if !self.groups.dirty {
            return;
        }
        let buckets = &mut self.groups.buckets;
        buckets.clear();
        buckets
            .entry(self.player.core.faction)
            .or_default()
            .push(Occupant::Player);
        for &id in &self.order {
            if let Some(creature) = self.actors.get(id)
                && !creature.is_dead()
            {
                buckets
                    .entry(creature.core().faction)
                    .or_default()
                    .push(Occupant::Actor(id));
            }
        }
        self.groups.dirty = false;
    }

    fn rebuild_occupancy(&mut self) {
        let occupancy = &mut self.roster.occupancy;
        occupancy.clear();
        occupancy.insert(self.player.core.pos, Occupant::Player);
        for &id in &self.order {
            let Some(creature) = self.actors.get(id) else {
                continue;
            };
            let entry = RosterEntry::of(creature);
            if !entry.dead {
                occupancy.entry(entry.pos).or_insert(Occupant::Actor(id));
            }
            self.roster.entries.insert(id, entry);
        }
    }
}

impl Remap for ActorRegistry {
    fn remap(&mut self, offset: Point) {
        self.player.core.pos = self.player.core.pos + offset;
        for creature in self.actors.values_mut() {
            let core = creature.core_mut();
            core.pos = core.pos + offset;
            creature.memory_mut().remap(offset);
        }
        self.rebuild_occupancy();
        self.groups.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Monster, Npc};

    fn registry() -> ActorRegistry {
        ActorRegistry::new(Player::new("you", Tripoint::new(66, 66, 0)))
    }

    #[test]
    fn insert_rejects_occupied_tile() {
        let mut reg = registry();
        let err = reg
            .insert(Monster::zombie(Tripoint::new(66, 66, 0)).into())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::TileOccupied {
                at: Tripoint::new(66, 66, 0),
                by: Occupant::Player
            }
        );
    }

    #[test]
    fn stale_handle_does_not_alias_new_actor() {
        let mut reg = registry();
        let first = reg.insert(Monster::zombie(Tripoint::new(1, 1, 0)).into()).unwrap();
        reg.remove(first);
        let second = reg.insert(Monster::zombie(Tripoint::new(2, 2, 0)).into()).unwrap();
        assert_ne!(first, second);
        assert!(reg.get(first).is_none());
        assert!(reg.get(second).is_some());
    }

    #[test]
    fn relocate_updates_occupancy() {
        let mut reg = registry();
        let id = reg.insert(Monster::zombie(Tripoint::new(1, 1, 0)).into()).unwrap();
        reg.relocate(Occupant::Actor(id), Tripoint::new(2, 1, 0)).unwrap();
        assert!(reg.is_free(Tripoint::new(1, 1, 0)));
        assert_eq!(reg.occupant_at(Tripoint::new(2, 1, 0)), Some(Occupant::Actor(id)));
        assert!(reg.relocate(Occupant::Actor(id), Tripoint::new(66, 66, 0)).is_err());
    }

    #[test]
    fn dead_actors_free_their_tile_and_are_swept() {
        let mut reg = registry();
        let id = reg.insert(Monster::zombie(Tripoint::new(1, 1, 0)).into()).unwrap();
        let keep = reg.insert(Npc::new("Ana", Tripoint::new(3, 3, 0), Faction::Ally).into()).unwrap();
        reg.mark_dead(id);
        assert!(reg.is_free(Tripoint::new(1, 1, 0)));
        let swept = reg.sweep_dead();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].0, id);
        assert_eq!(reg.ids().collect::<Vec<_>>(), vec![keep]);
    }

    #[test]
    fn hostiles_come_from_opposing_buckets() {
        let mut reg = registry();
        let zombie = reg.insert(Monster::zombie(Tripoint::new(1, 1, 0)).into()).unwrap();
        reg.insert(Npc::new("Ana", Tripoint::new(3, 3, 0), Faction::Ally).into()).unwrap();
        reg.refresh_groups();
        let hostiles: Vec<_> = reg.view().hostiles_of(Faction::Player).collect();
        assert_eq!(hostiles, vec![(Occupant::Actor(zombie), Tripoint::new(1, 1, 0))]);
        let for_zombie = reg.view().hostiles_of(Faction::Zombie).count();
        assert_eq!(for_zombie, 2);
    }

    #[test]
    fn remap_shifts_everyone() {
        let mut reg = registry();
        let id = reg.insert(Monster::zombie(Tripoint::new(13, 1, 0)).into()).unwrap();
        reg.remap(Point::new(-12, 0));
        assert_eq!(reg.player().core.pos, Tripoint::new(54, 66, 0));
        assert_eq!(reg.position_of(Occupant::Actor(id)), Some(Tripoint::new(1, 1, 0)));
        assert_eq!(reg.occupant_at(Tripoint::new(1, 1, 0)), Some(Occupant::Actor(id)));
    }
}
