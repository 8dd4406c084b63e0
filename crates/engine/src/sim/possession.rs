use tracing::{debug, info, warn};

use super::config::SimConfig;
use super::enemies::EnemyController;
use super::enemy::Enemy;
use super::entity::EntityId;
use super::player::Player;
use super::timers::TimerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PossessionState {
    /// The player controls the cat.
    Free,
    /// The player drives an enemy body; the cat is hidden.
    Possessing { enemy: EntityId },
    /// Non-interactive animation window.
    Transitioning(Transition),
    /// Terminal for the level until reset.
    Caught,
}

impl PossessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Possessing { .. } => "possessing",
            Self::Transitioning(_) => "transitioning",
            Self::Caught => "caught",
        }
    }
}

/// State to return to once a door or passage animation finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Free,
    Possessing { enemy: EntityId },
}

impl Resume {
    pub fn state(self) -> PossessionState {
        match self {
            Self::Free => PossessionState::Free,
            Self::Possessing { enemy } => PossessionState::Possessing { enemy },
        }
    }

    pub fn from_state(state: PossessionState) -> Option<Self> {
        match state {
            PossessionState::Free => Some(Self::Free),
            PossessionState::Possessing { enemy } => Some(Self::Possessing { enemy }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnteringBody {
        enemy: EntityId,
    },
    LeavingBody {
        enemy: EntityId,
    },
    Passage {
        from: EntityId,
        to: EntityId,
        resume: Resume,
    },
    DoorToggle {
        door: EntityId,
        resume: Resume,
    },
}

impl Transition {
    fn owner(&self) -> EntityId {
        match *self {
            Self::EnteringBody { enemy } | Self::LeavingBody { enemy } => enemy,
            Self::Passage { from, .. } => from,
            Self::DoorToggle { door, .. } => door,
        }
    }

    pub fn settled_state(&self) -> PossessionState {
        match *self {
            Self::EnteringBody { enemy } => PossessionState::Possessing { enemy },
            Self::LeavingBody { .. } => PossessionState::Free,
            Self::Passage { resume, .. } | Self::DoorToggle { resume, .. } => resume.state(),
        }
    }
}

/// Why an edge-triggered intent was ignored. Never surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    InputLocked,
    NoChargesLeft,
    AlreadyPossessing,
    NoTargetInRange,
    NotPossessing,
    NothingTapped,
    OutOfReach,
    NeedsPossession,
    NeedsCatForm,
    Locked,
    UnpairedPassage,
}

#[derive(Debug, Clone)]
pub struct PossessionMachine {
    state: PossessionState,
    timers: TimerQueue<Transition>,
}

impl PossessionMachine {
    pub fn new(state: PossessionState) -> Self {
        Self {
            state,
            timers: TimerQueue::new(),
        }
    }

    pub fn state(&self) -> PossessionState {
        self.state
    }

    pub fn accepts_input(&self) -> bool {
        matches!(
            self.state,
            PossessionState::Free | PossessionState::Possessing { .. }
        )
    }

    pub fn is_caught(&self) -> bool {
        matches!(self.state, PossessionState::Caught)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Enters the animation window and schedules its completion.
    pub(crate) fn begin(&mut self, transition: Transition, delay_ms: u64) -> PossessionState {
        let from = self.state;
        self.state = PossessionState::Transitioning(transition);
        self.timers.schedule(transition.owner(), delay_ms, transition);
        from
    }

    /// Advances the timer clock and settles every transition that is still
    /// the one in progress. Anything else is stale and dropped.
    pub(crate) fn settle_due(&mut self, dt_ms: u64) -> Vec<Transition> {
        let mut settled = Vec::new();
        for fired in self.timers.advance(dt_ms) {
            if self.state == PossessionState::Transitioning(fired.payload) {
                self.state = fired.payload.settled_state();
                settled.push(fired.payload);
            } else {
                warn!(
                    owner = fired.owner.0,
                    state = self.state.name(),
                    "stale_transition_timer_ignored"
                );
            }
        }
        settled
    }

    /// Returns the previous state, or `None` if already caught.
    pub(crate) fn catch(&mut self) -> Option<PossessionState> {
        if self.is_caught() {
            return None;
        }
        let from = self.state;
        self.state = PossessionState::Caught;
        self.timers.clear();
        Some(from)
    }

    pub(crate) fn force(&mut self, state: PossessionState) {
        self.state = state;
    }

    pub(crate) fn cancel_for(&mut self, owner: EntityId) -> usize {
        self.timers.cancel_owner(owner)
    }
}

/// `Free -> Transitioning -> Possessing`. Consumes one charge on success.
pub fn try_possess(
    machine: &mut PossessionMachine,
    player: &mut Player,
    enemies: &mut EnemyController,
    config: &SimConfig,
) -> Result<EntityId, DropReason> {
    match machine.state() {
        PossessionState::Free => {}
        PossessionState::Possessing { .. } => return Err(DropReason::AlreadyPossessing),
        _ => return Err(DropReason::InputLocked),
    }
    if player.in_transit() {
        return Err(DropReason::InputLocked);
    }
    if !player.can_possess() {
        return Err(if player.is_possessing() {
            DropReason::AlreadyPossessing
        } else {
            DropReason::NoChargesLeft
        });
    }
    let target = enemies
        .closest_in_range(
            player.placement.x,
            player.placement.level,
            config.possess_range,
        )
        .ok_or(DropReason::NoTargetInRange)?;

    if !player.begin_possession(target) || !enemies.set_possessed(target) {
        return Err(DropReason::NoTargetInRange);
    }
    machine.begin(Transition::EnteringBody { enemy: target }, config.possess_delay_ms);
    info!(
        enemy_id = target.0,
        charges_left = player.possessions_remaining,
        "possess_started"
    );
    Ok(target)
}

/// `Possessing -> Transitioning -> Free`. The body is removed for good and
/// the cat reappears where it stood.
pub fn try_unpossess(
    machine: &mut PossessionMachine,
    player: &mut Player,
    enemies: &mut EnemyController,
    config: &SimConfig,
) -> Result<Enemy, DropReason> {
    let enemy_id = match machine.state() {
        PossessionState::Possessing { enemy } => enemy,
        PossessionState::Free => return Err(DropReason::NotPossessing),
        _ => return Err(DropReason::InputLocked),
    };
    if player.in_transit() {
        return Err(DropReason::InputLocked);
    }
    let Some(body) = enemies.remove(enemy_id) else {
        warn!(enemy_id = enemy_id.0, "possessed_body_missing");
        player.end_possession(player.placement.x, player.placement.level);
        machine.force(PossessionState::Free);
        return Err(DropReason::NotPossessing);
    };
    player.end_possession(body.x(), body.level());
    let cancelled = machine.cancel_for(enemy_id);
    if cancelled > 0 {
        debug!(enemy_id = enemy_id.0, cancelled, "body_timers_cancelled");
    }
    machine.begin(
        Transition::LeavingBody { enemy: enemy_id },
        config.unpossess_delay_ms,
    );
    info!(
        enemy_id = enemy_id.0,
        x = body.x(),
        level = body.level(),
        charges_left = player.possessions_remaining,
        "unpossessed"
    );
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Placement;
    use crate::sim::objects::KeySet;

    fn setup(charges: u32) -> (PossessionMachine, Player, EnemyController, SimConfig) {
        let mut enemies = EnemyController::new();
        enemies.insert(Enemy::new(
            EntityId(1),
            Placement::at(200.0, 0),
            150.0,
            250.0,
            300.0,
            KeySet::new(),
        ));
        (
            PossessionMachine::new(PossessionState::Free),
            Player::new(Placement::at(100.0, 0), charges),
            enemies,
            SimConfig::default(),
        )
    }

    #[test]
    fn possess_then_settle_reaches_possessing() {
        let (mut machine, mut player, mut enemies, config) = setup(2);

        let target = try_possess(&mut machine, &mut player, &mut enemies, &config).expect("possess");
        assert_eq!(target, EntityId(1));
        assert_eq!(player.possessions_remaining, 1);
        assert_eq!(enemies.possessed(), Some(EntityId(1)));
        assert!(!machine.accepts_input());

        let settled = machine.settle_due(config.possess_delay_ms);
        assert_eq!(settled.len(), 1);
        assert_eq!(
            machine.state(),
            PossessionState::Possessing { enemy: EntityId(1) }
        );
    }

    #[test]
    fn possess_without_charges_is_dropped() {
        let (mut machine, mut player, mut enemies, config) = setup(0);
        assert_eq!(
            try_possess(&mut machine, &mut player, &mut enemies, &config),
            Err(DropReason::NoChargesLeft)
        );
        assert_eq!(machine.state(), PossessionState::Free);
        assert_eq!(enemies.possessed(), None);
    }

    #[test]
    fn possess_out_of_range_keeps_charge() {
        let (mut machine, mut player, mut enemies, config) = setup(1);
        player.placement.x = -100.0;
        assert_eq!(
            try_possess(&mut machine, &mut player, &mut enemies, &config),
            Err(DropReason::NoTargetInRange)
        );
        assert_eq!(player.possessions_remaining, 1);
    }

    #[test]
    fn unpossess_removes_body_without_refund() {
        let (mut machine, mut player, mut enemies, config) = setup(2);
        try_possess(&mut machine, &mut player, &mut enemies, &config).expect("possess");
        machine.settle_due(config.possess_delay_ms);

        let body = try_unpossess(&mut machine, &mut player, &mut enemies, &config).expect("unpossess");
        assert_eq!(body.id, EntityId(1));
        assert!(enemies.is_empty());
        assert_eq!(enemies.possessed(), None);
        assert_eq!(player.possessions_remaining, 1);
        assert_eq!(player.placement.x, 200.0);

        machine.settle_due(config.unpossess_delay_ms);
        assert_eq!(machine.state(), PossessionState::Free);
    }

    #[test]
    fn unpossess_during_transition_is_dropped() {
        let (mut machine, mut player, mut enemies, config) = setup(2);
        try_possess(&mut machine, &mut player, &mut enemies, &config).expect("possess");
        assert_eq!(
            try_unpossess(&mut machine, &mut player, &mut enemies, &config).map(|e| e.id),
            Err(DropReason::InputLocked)
        );
        assert_eq!(enemies.len(), 1);
    }

    #[test]
    fn catch_clears_timers_and_is_terminal() {
        let (mut machine, mut player, mut enemies, config) = setup(2);
        try_possess(&mut machine, &mut player, &mut enemies, &config).expect("possess");
        assert_eq!(machine.pending_timers(), 1);

        assert!(machine.catch().is_some());
        assert_eq!(machine.pending_timers(), 0);
        assert!(machine.catch().is_none());
        assert!(machine.settle_due(10_000).is_empty());
        assert_eq!(machine.state(), PossessionState::Caught);
    }

    #[test]
    fn stale_timer_does_not_override_current_state() {
        let mut machine = PossessionMachine::new(PossessionState::Free);
        machine.begin(
            Transition::DoorToggle {
                door: EntityId(5),
                resume: Resume::Free,
            },
            100,
        );
        machine.force(PossessionState::Possessing { enemy: EntityId(2) });

        assert!(machine.settle_due(100).is_empty());
        assert_eq!(
            machine.state(),
            PossessionState::Possessing { enemy: EntityId(2) }
        );
    }
}
