use crate::actor::{Activity, Distraction};
use crate::state::{Direction, WorldState};

/// Action chosen for the player by the input collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerAction {
    /// Step one tile; stepping into a hostile attacks it.
    Move(Direction),
    /// Spend the rest of the turn.
    Wait,
    Ascend,
    Descend,
    StartActivity(Activity),
    Quit,
    SaveAndQuit,
}

/// Source of player decisions.
pub trait PlayerInput {
    fn next_action(&mut self, world: &WorldState) -> PlayerAction;

    /// Asked when something distracts the player during an activity.
    /// Returning `true` cancels the activity.
    fn confirm_cancel(&mut self, _activity: &Activity, _reason: Distraction) -> bool {
        true
    }
}

/// Input that always waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleInput;

impl PlayerInput for IdleInput {
    fn next_action(&mut self, _world: &WorldState) -> PlayerAction {
        PlayerAction::Wait
    }
}
