use tracing::{debug, info, warn};

use super::config::SimConfig;
use super::detection::{first_detector, DetectionTarget};
use super::enemies::EnemyController;
use super::enemy::{Enemy, StepOutcome};
use super::entity::{EntityId, EntityIdAllocator, Facing, Placement, Vec2};
use super::events::{AudioSink, FrameEvent, FrameEvents, SoundCue};
use super::objects::{DoorState, KeySet, ObjectKind, ObjectSet, Passage, PlacedObject};
use super::player::Player;
use super::possession::{
    try_possess, try_unpossess, DropReason, PossessionMachine, PossessionState, Resume,
    Transition,
};
use crate::content::{
    DoorDef, EnemyDef, LevelDefinition, MarkerDef, PlayerDef, StaircaseDoorDef,
};
use crate::input::IntentSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Door,
    Staircase,
    Den,
    Rescue,
}

/// One live level: the world built from a definition plus the possession
/// state machine that drives it.
#[derive(Debug, Clone)]
pub struct LevelSession {
    config: SimConfig,
    origin: LevelDefinition,
    floor_count: u32,
    level_index: u32,
    player: Player,
    enemies: EnemyController,
    objects: ObjectSet,
    machine: PossessionMachine,
    status: LevelStatus,
    events: FrameEvents,
    ms_carry: f64,
    tick_count: u64,
}

impl LevelSession {
    /// Builds the world. Expects a definition that already passed
    /// `validate_level`.
    pub fn from_definition(def: LevelDefinition, config: SimConfig) -> Self {
        let mut ids = EntityIdAllocator::default();
        let objects = build_objects(&def, &mut ids);
        let enemies = build_enemies(&def, &config, &mut ids);

        let mut player = Player::new(
            Placement::at(def.player.x_pos, def.player.level),
            def.player.num_possessions,
        );
        let state = match enemies.possessed() {
            Some(enemy) => {
                player.possessing = Some(enemy);
                player.set_hidden(true);
                PossessionState::Possessing { enemy }
            }
            None => PossessionState::Free,
        };

        info!(
            level = def.level,
            floors = def.floor,
            enemies = enemies.len(),
            objects = objects.len(),
            state = state.name(),
            "level_session_built"
        );

        Self {
            config,
            floor_count: def.floor,
            level_index: def.level,
            origin: def,
            player,
            enemies,
            objects,
            machine: PossessionMachine::new(state),
            status: LevelStatus::Playing,
            events: FrameEvents::default(),
            ms_carry: 0.0,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn status(&self) -> LevelStatus {
        self.status
    }

    pub fn state(&self) -> PossessionState {
        self.machine.state()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &EnemyController {
        &self.enemies
    }

    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    pub fn events(&self) -> &FrameEvents {
        &self.events
    }

    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    pub fn floor_count(&self) -> u32 {
        self.floor_count
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn pending_timers(&self) -> usize {
        self.machine.pending_timers()
    }

    /// World position of whatever the player currently controls.
    pub fn actor_position(&self) -> Vec2 {
        self.actor_placement().position(self.config.floor_height)
    }

    /// Rebuilds the level from the definition this session started from.
    pub fn reset(&mut self) {
        let origin = self.origin.clone();
        let config = self.config.clone();
        *self = Self::from_definition(origin, config);
    }

    /// Makes the current live state the one `reset` returns to.
    pub fn checkpoint(&mut self) {
        self.origin = self.to_definition();
    }

    pub fn tick(
        &mut self,
        dt_seconds: f32,
        intents: &IntentSnapshot,
        audio: &mut dyn AudioSink,
    ) -> &FrameEvents {
        if intents.reset_pressed() {
            self.reset();
            info!(level = self.level_index, "level_reset");
            self.events.finish_tick_rollover();
            return &self.events;
        }

        self.events.clear_current_tick();
        self.tick_count = self.tick_count.saturating_add(1);
        if self.status != LevelStatus::Playing {
            self.events.finish_tick_rollover();
            return &self.events;
        }

        let dt_seconds = if dt_seconds.is_finite() {
            dt_seconds.max(0.0)
        } else {
            0.0
        };
        let dt_ms = self.consume_dt_ms(dt_seconds);

        self.settle_transitions(dt_ms);
        self.apply_intents(intents, audio);
        if self.status == LevelStatus::Playing {
            self.move_actor(intents.move_direction(), dt_seconds);
            self.patrol(dt_seconds);
            let actor = self.actor_placement();
            self.enemies
                .refresh_closest(actor.x, actor.level, self.config.possess_range);
            self.check_detection(audio);
        }

        self.events.finish_tick_rollover();
        &self.events
    }

    /// Mirrors live state into the level document shape.
    pub fn to_definition(&self) -> LevelDefinition {
        let mut def = LevelDefinition {
            player: PlayerDef {
                x_pos: self.player.placement.x,
                level: self.player.placement.level,
                num_possessions: self.player.possessions_remaining,
            },
            enemy: Vec::with_capacity(self.enemies.len()),
            staircase_door: Vec::new(),
            door: Vec::new(),
            wall: Vec::new(),
            decorations: Vec::new(),
            floor: self.floor_count,
            level: self.level_index,
        };

        for object in self.objects.iter() {
            let x_pos = object.placement.x;
            let level = object.placement.level;
            match &object.kind {
                ObjectKind::Wall => def.wall.push(MarkerDef { x_pos, level }),
                ObjectKind::Door(door) => def.door.push(DoorDef {
                    x_pos,
                    level,
                    key_int: door.required_keys.to_vec(),
                    is_open: door.open,
                    is_unlocked: door.unlocked,
                }),
                ObjectKind::StaircaseDoor(passage) | ObjectKind::CatDen(passage) => {
                    def.staircase_door.push(StaircaseDoorDef {
                        x_pos,
                        level,
                        connection: passage.connection,
                        is_den: matches!(object.kind, ObjectKind::CatDen(_)),
                        key_int: passage.required_keys.to_vec(),
                    })
                }
                ObjectKind::CagedAnimal => def.decorations.push(MarkerDef { x_pos, level }),
                ObjectKind::Floor | ObjectKind::DoorFrame => {}
            }
        }

        for enemy in self.enemies.iter() {
            def.enemy.push(EnemyDef {
                x_pos: enemy.x(),
                level: enemy.level(),
                patrol_start: enemy.patrol_start,
                patrol_end: enemy.patrol_end,
                key_int: enemy.keys.to_vec(),
                possessed: enemy.possessed,
                facing_right: enemy.facing.is_right(),
                vision_range: (enemy.vision_range != self.config.default_vision_range)
                    .then_some(enemy.vision_range),
            });
        }
        def
    }

    fn consume_dt_ms(&mut self, dt_seconds: f32) -> u64 {
        let total = self.ms_carry + f64::from(dt_seconds) * 1000.0;
        let whole = total.floor();
        self.ms_carry = total - whole;
        whole as u64
    }

    fn actor_placement(&self) -> Placement {
        self.player
            .possessing
            .and_then(|enemy| self.enemies.get(enemy))
            .map(|body| body.placement)
            .unwrap_or(self.player.placement)
    }

    fn actor_keys(&self) -> KeySet {
        self.player
            .possessing
            .and_then(|enemy| self.enemies.get(enemy))
            .map(|body| body.keys.clone())
            .unwrap_or_default()
    }

    fn settle_transitions(&mut self, dt_ms: u64) {
        for transition in self.machine.settle_due(dt_ms) {
            self.events.emit(FrameEvent::StateChanged {
                from: PossessionState::Transitioning(transition),
                to: transition.settled_state(),
            });
            match transition {
                Transition::EnteringBody { enemy } if !self.enemies.contains(enemy) => {
                    warn!(enemy_id = enemy.0, "possessed_body_missing");
                    self.player
                        .end_possession(self.player.placement.x, self.player.placement.level);
                    self.machine.force(PossessionState::Free);
                }
                Transition::Passage { from, to, .. } => self.finish_passage(from, to),
                _ => {}
            }
            debug!(state = self.machine.state().name(), "transition_settled");
        }
    }

    fn finish_passage(&mut self, from: EntityId, to: EntityId) {
        let Some(exit) = self.objects.get(to).map(|object| object.placement) else {
            warn!(from = from.0, to = to.0, "passage_exit_missing");
            self.player.leave_transit();
            return;
        };
        let floor_height = self.config.floor_height;
        match self.player.possessing {
            Some(enemy) => {
                if let Some(body) = self.enemies.get_mut(enemy) {
                    body.placement.x = exit.x;
                    body.placement.level = exit.level;
                    self.events.emit(FrameEvent::EntityMoved {
                        id: enemy,
                        position: body.placement.position(floor_height),
                        angle: body.placement.angle,
                    });
                }
            }
            None => {
                self.player.placement.x = exit.x;
                self.player.placement.level = exit.level;
                self.events.emit(FrameEvent::PlayerMoved {
                    position: self.player.placement.position(floor_height),
                    angle: self.player.placement.angle,
                });
            }
        }
        self.player.leave_transit();
        self.events.emit(FrameEvent::PlayerHidden {
            hidden: self.player.hidden,
        });
        info!(from = from.0, to = to.0, level = exit.level, "passage_completed");
    }

    fn apply_intents(&mut self, intents: &IntentSnapshot, audio: &mut dyn AudioSink) {
        if intents.possess_pressed() {
            let from = self.machine.state();
            match try_possess(
                &mut self.machine,
                &mut self.player,
                &mut self.enemies,
                &self.config,
            ) {
                Ok(_) => {
                    audio.play(SoundCue::Possess);
                    self.events.emit(FrameEvent::StateChanged {
                        from,
                        to: self.machine.state(),
                    });
                    self.events.emit(FrameEvent::PlayerHidden { hidden: true });
                }
                Err(reason) => self.drop_intent("possess", reason),
            }
        }

        if intents.unpossess_pressed() {
            let from = self.machine.state();
            match try_unpossess(
                &mut self.machine,
                &mut self.player,
                &mut self.enemies,
                &self.config,
            ) {
                Ok(body) => {
                    audio.play(SoundCue::Unpossess);
                    self.events.emit(FrameEvent::EntityRemoved { id: body.id });
                    self.events.emit(FrameEvent::StateChanged {
                        from,
                        to: self.machine.state(),
                    });
                    self.events.emit(FrameEvent::PlayerHidden { hidden: false });
                    self.events.emit(FrameEvent::PlayerMoved {
                        position: self.player.placement.position(self.config.floor_height),
                        angle: self.player.placement.angle,
                    });
                }
                Err(reason) => self.drop_intent("unpossess", reason),
            }
        }

        if let Some(tap) = intents.tap_world() {
            if let Err(reason) = self.interact(tap, audio) {
                self.drop_intent("tap", reason);
            }
        }
    }

    fn drop_intent(&mut self, intent: &'static str, reason: DropReason) {
        debug!(intent, reason = ?reason, state = self.machine.state().name(), "intent_dropped");
        self.events.emit(FrameEvent::IntentDropped { reason });
    }

    fn interact(&mut self, tap: Vec2, audio: &mut dyn AudioSink) -> Result<(), DropReason> {
        if !self.machine.accepts_input() || self.player.in_transit() {
            return Err(DropReason::InputLocked);
        }
        let target = self
            .objects
            .interactable_at(
                tap.x,
                tap.y,
                self.config.interactable_half_width,
                self.config.floor_height,
            )
            .ok_or(DropReason::NothingTapped)?;
        let object = self.objects.get(target).ok_or(DropReason::NothingTapped)?;

        let actor = self.actor_placement();
        if !object.placement.same_level(&actor)
            || object.placement.horizontal_distance(&actor) > self.config.interaction_range
        {
            return Err(DropReason::OutOfReach);
        }
        let interaction = match &object.kind {
            ObjectKind::Door(_) => Interaction::Door,
            ObjectKind::StaircaseDoor(_) => Interaction::Staircase,
            ObjectKind::CatDen(_) => Interaction::Den,
            ObjectKind::CagedAnimal => Interaction::Rescue,
            _ => return Err(DropReason::NothingTapped),
        };

        match interaction {
            Interaction::Door => self.toggle_door(target, audio),
            Interaction::Staircase => self.enter_passage(target, false, audio),
            Interaction::Den => self.enter_passage(target, true, audio),
            Interaction::Rescue => self.rescue(audio),
        }
    }

    fn toggle_door(&mut self, id: EntityId, audio: &mut dyn AudioSink) -> Result<(), DropReason> {
        let resume = Resume::from_state(self.machine.state()).ok_or(DropReason::InputLocked)?;
        let carried = self.actor_keys();
        let Some(ObjectKind::Door(door)) = self.objects.get_mut(id).map(|object| &mut object.kind)
        else {
            return Err(DropReason::NothingTapped);
        };
        if !door.toggle(&carried) {
            audio.play(SoundCue::DoorLocked);
            return Err(DropReason::Locked);
        }
        let open = door.open;

        audio.play(if open {
            SoundCue::DoorOpen
        } else {
            SoundCue::DoorClose
        });
        self.events.emit(FrameEvent::DoorChanged { id, open });
        let from = self.machine.begin(
            Transition::DoorToggle { door: id, resume },
            self.config.door_toggle_delay_ms,
        );
        self.events.emit(FrameEvent::StateChanged {
            from,
            to: self.machine.state(),
        });
        info!(door_id = id.0, open, "door_toggled");
        Ok(())
    }

    fn enter_passage(
        &mut self,
        id: EntityId,
        den: bool,
        audio: &mut dyn AudioSink,
    ) -> Result<(), DropReason> {
        let resume = Resume::from_state(self.machine.state()).ok_or(DropReason::InputLocked)?;
        match (den, resume) {
            (false, Resume::Free) => return Err(DropReason::NeedsPossession),
            (true, Resume::Possessing { .. }) => return Err(DropReason::NeedsCatForm),
            _ => {}
        }
        let pair = self
            .objects
            .paired_passage(id)
            .ok_or(DropReason::UnpairedPassage)?;

        let carried = self.actor_keys();
        let unlocked = match self.objects.get_mut(id).map(|object| &mut object.kind) {
            Some(ObjectKind::StaircaseDoor(passage) | ObjectKind::CatDen(passage)) => {
                passage.try_unlock(&carried)
            }
            _ => false,
        };
        if !unlocked {
            audio.play(SoundCue::DoorLocked);
            return Err(DropReason::Locked);
        }

        if den {
            self.player.enter_den(id);
        } else {
            self.player.enter_door(id);
        }
        audio.play(SoundCue::Passage);
        self.events.emit(FrameEvent::PlayerHidden { hidden: true });
        let from = self.machine.begin(
            Transition::Passage {
                from: id,
                to: pair,
                resume,
            },
            self.config.passage_delay_ms,
        );
        self.events.emit(FrameEvent::StateChanged {
            from,
            to: self.machine.state(),
        });
        info!(passage_id = id.0, pair = pair.0, den, "passage_entered");
        Ok(())
    }

    fn rescue(&mut self, audio: &mut dyn AudioSink) -> Result<(), DropReason> {
        if self.machine.state() != PossessionState::Free {
            return Err(DropReason::NeedsCatForm);
        }
        self.status = LevelStatus::Won;
        audio.play(SoundCue::Rescue);
        self.events.emit(FrameEvent::LevelWon);
        info!(
            level = self.level_index,
            charges_left = self.player.possessions_remaining,
            ticks = self.tick_count,
            "level_won"
        );
        Ok(())
    }

    fn move_actor(&mut self, direction: Option<Facing>, dt_seconds: f32) {
        if self.player.in_transit() {
            return;
        }
        let floor_height = self.config.floor_height;
        match self.machine.state() {
            PossessionState::Free => {
                if self.player.walk(
                    direction,
                    dt_seconds,
                    self.config.cat_move_speed,
                    &self.objects,
                ) {
                    self.events.emit(FrameEvent::PlayerMoved {
                        position: self.player.placement.position(floor_height),
                        angle: self.player.placement.angle,
                    });
                }
            }
            PossessionState::Possessing { enemy } => {
                let Some(body) = self.enemies.get_mut(enemy) else {
                    return;
                };
                let outcome = body.controlled_step(
                    direction,
                    dt_seconds,
                    self.config.possessed_move_speed,
                    &self.objects,
                );
                if outcome == StepOutcome::Moved {
                    self.events.emit(FrameEvent::EntityMoved {
                        id: enemy,
                        position: body.placement.position(floor_height),
                        angle: body.placement.angle,
                    });
                }
            }
            PossessionState::Transitioning(_) | PossessionState::Caught => {}
        }
    }

    fn patrol(&mut self, dt_seconds: f32) {
        let speed = self.config.enemy_patrol_speed;
        let floor_height = self.config.floor_height;
        for enemy in self.enemies.iter_mut() {
            match enemy.patrol_step(dt_seconds, speed, &self.objects) {
                StepOutcome::Moved | StepOutcome::Flipped => {
                    self.events.emit(FrameEvent::EntityMoved {
                        id: enemy.id,
                        position: enemy.placement.position(floor_height),
                        angle: enemy.placement.angle,
                    });
                }
                StepOutcome::Blocked | StepOutcome::Idle => {}
            }
        }
    }

    fn check_detection(&mut self, audio: &mut dyn AudioSink) {
        if self.player.in_transit() {
            return;
        }
        let target = match self.machine.state() {
            PossessionState::Free if !self.player.hidden => {
                DetectionTarget::from_placement(&self.player.placement, None)
            }
            PossessionState::Possessing { enemy } => match self.enemies.get(enemy) {
                Some(body) => DetectionTarget::from_placement(&body.placement, Some(enemy)),
                None => return,
            },
            _ => return,
        };
        let Some(by) = first_detector(&self.enemies, &target, &self.objects) else {
            return;
        };
        let Some(from) = self.machine.catch() else {
            return;
        };
        self.status = LevelStatus::Lost;
        audio.play(SoundCue::Caught);
        self.events.emit(FrameEvent::StateChanged {
            from,
            to: PossessionState::Caught,
        });
        self.events.emit(FrameEvent::Caught { by });
        info!(
            by = by.0,
            x = target.x,
            level = target.level,
            possessing = target.body.is_some(),
            "player_caught"
        );
    }
}

fn build_objects(def: &LevelDefinition, ids: &mut EntityIdAllocator) -> ObjectSet {
    let mut objects = ObjectSet::new();
    let mut place = |objects: &mut ObjectSet, x: f32, level: u32, kind: ObjectKind| {
        objects.push(PlacedObject {
            id: ids.alloc(),
            placement: Placement::at(x, level),
            kind,
        });
    };

    for level in 0..def.floor {
        place(&mut objects, 0.0, level, ObjectKind::Floor);
    }
    for wall in &def.wall {
        place(&mut objects, wall.x_pos, wall.level, ObjectKind::Wall);
    }
    for door in &def.door {
        let mut state = DoorState::new(door.is_open, door.key_int.iter().copied().collect());
        state.unlocked = door.is_unlocked;
        place(&mut objects, door.x_pos, door.level, ObjectKind::Door(state));
        place(&mut objects, door.x_pos, door.level, ObjectKind::DoorFrame);
    }
    for passage_def in &def.staircase_door {
        let mut passage = Passage::new(passage_def.connection);
        passage.required_keys = passage_def.key_int.iter().copied().collect();
        let kind = if passage_def.is_den {
            ObjectKind::CatDen(passage)
        } else {
            ObjectKind::StaircaseDoor(passage)
        };
        place(&mut objects, passage_def.x_pos, passage_def.level, kind);
    }
    for decoration in &def.decorations {
        place(
            &mut objects,
            decoration.x_pos,
            decoration.level,
            ObjectKind::CagedAnimal,
        );
    }
    objects
}

fn build_enemies(
    def: &LevelDefinition,
    config: &SimConfig,
    ids: &mut EntityIdAllocator,
) -> EnemyController {
    let mut enemies = EnemyController::new();
    for (index, enemy_def) in def.enemy.iter().enumerate() {
        let (patrol_start, patrol_end) = if enemy_def.patrol_start <= enemy_def.patrol_end {
            (enemy_def.patrol_start, enemy_def.patrol_end)
        } else {
            warn!(
                enemy_index = index,
                patrol_start = enemy_def.patrol_start,
                patrol_end = enemy_def.patrol_end,
                "patrol_bounds_reversed"
            );
            (enemy_def.patrol_end, enemy_def.patrol_start)
        };
        let mut enemy = Enemy::new(
            ids.alloc(),
            Placement::at(enemy_def.x_pos, enemy_def.level),
            patrol_start,
            patrol_end,
            enemy_def
                .vision_range
                .unwrap_or(config.default_vision_range),
            enemy_def.key_int.iter().copied().collect(),
        );
        enemy.set_facing(Facing::from_right(enemy_def.facing_right));
        enemy.possessed = enemy_def.possessed;
        enemies.insert(enemy);
    }
    enemies
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
