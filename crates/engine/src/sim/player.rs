use super::entity::{EntityId, Facing, Placement};
use super::objects::ObjectSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub placement: Placement,
    pub possessions_remaining: u32,
    /// Weak handle; the enemy controller owns the body.
    pub possessing: Option<EntityId>,
    pub hidden: bool,
    pub in_den: Option<EntityId>,
    pub in_door: Option<EntityId>,
    pub facing: Facing,
}

impl Player {
    pub fn new(placement: Placement, possessions_remaining: u32) -> Self {
        Self {
            placement,
            possessions_remaining,
            possessing: None,
            hidden: false,
            in_den: None,
            in_door: None,
            facing: Facing::Right,
        }
    }

    pub fn can_possess(&self) -> bool {
        self.possessions_remaining > 0 && self.possessing.is_none()
    }

    pub fn is_possessing(&self) -> bool {
        self.possessing.is_some()
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn in_transit(&self) -> bool {
        self.in_den.is_some() || self.in_door.is_some()
    }

    /// Consumes a charge and records the body. Charges are never refunded.
    pub(crate) fn begin_possession(&mut self, enemy: EntityId) -> bool {
        if !self.can_possess() {
            return false;
        }
        self.possessions_remaining -= 1;
        self.possessing = Some(enemy);
        self.hidden = true;
        true
    }

    pub(crate) fn end_possession(&mut self, x: f32, level: u32) {
        self.possessing = None;
        self.placement.x = x;
        self.placement.level = level;
        self.hidden = false;
    }

    pub(crate) fn enter_den(&mut self, den: EntityId) {
        self.in_den = Some(den);
        self.set_hidden(true);
    }

    pub(crate) fn enter_door(&mut self, door: EntityId) {
        self.in_door = Some(door);
        self.set_hidden(true);
    }

    /// Clears transit markers. The cat stays hidden while inside a body.
    pub(crate) fn leave_transit(&mut self) {
        self.in_den = None;
        self.in_door = None;
        self.set_hidden(self.is_possessing());
    }

    pub(crate) fn walk(
        &mut self,
        direction: Option<Facing>,
        dt_seconds: f32,
        speed: f32,
        objects: &ObjectSet,
    ) -> bool {
        let Some(direction) = direction else {
            self.placement.velocity = 0.0;
            return false;
        };
        self.facing = direction;
        self.placement.face(direction);
        let from = self.placement.x;
        let to = from + direction.sign() * speed * dt_seconds;
        if objects.step_blocked(self.placement.level, from, to) {
            self.placement.velocity = 0.0;
            return false;
        }
        self.placement.x = to;
        self.placement.velocity = direction.sign() * speed;
        true
    }
}
