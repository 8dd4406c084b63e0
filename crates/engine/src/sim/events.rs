use super::entity::{EntityId, Vec2};
use super::possession::{DropReason, PossessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Possess,
    Unpossess,
    DoorOpen,
    DoorClose,
    DoorLocked,
    Passage,
    Caught,
    Rescue,
}

impl SoundCue {
    pub fn asset_key(self) -> &'static str {
        match self {
            Self::Possess => "sfx.possess",
            Self::Unpossess => "sfx.unpossess",
            Self::DoorOpen => "sfx.door_open",
            Self::DoorClose => "sfx.door_close",
            Self::DoorLocked => "sfx.door_locked",
            Self::Passage => "sfx.passage",
            Self::Caught => "sfx.caught",
            Self::Rescue => "sfx.rescue",
        }
    }
}

/// Audio collaborator supplied by the host.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<SoundCue>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }
}

/// Simulation deltas for the presentation layer, produced once per tick.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    EntityMoved {
        id: EntityId,
        position: Vec2,
        angle: f32,
    },
    PlayerMoved {
        position: Vec2,
        angle: f32,
    },
    EntityRemoved {
        id: EntityId,
    },
    DoorChanged {
        id: EntityId,
        open: bool,
    },
    PlayerHidden {
        hidden: bool,
    },
    StateChanged {
        from: PossessionState,
        to: PossessionState,
    },
    Caught {
        by: EntityId,
    },
    LevelWon,
    IntentDropped {
        reason: DropReason,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEventCounts {
    pub moved: u32,
    pub removed: u32,
    pub door_changes: u32,
    pub state_changes: u32,
    pub dropped_intents: u32,
}

#[derive(Debug, Default, Clone)]
pub struct FrameEvents {
    current_tick_events: Vec<FrameEvent>,
    last_tick_counts: FrameEventCounts,
}

impl FrameEvents {
    pub(crate) fn clear_current_tick(&mut self) {
        self.current_tick_events.clear();
    }

    pub(crate) fn emit(&mut self, event: FrameEvent) {
        self.current_tick_events.push(event);
    }

    pub(crate) fn finish_tick_rollover(&mut self) {
        let mut counts = FrameEventCounts::default();
        for event in &self.current_tick_events {
            match event {
                FrameEvent::EntityMoved { .. } | FrameEvent::PlayerMoved { .. } => {
                    counts.moved = counts.moved.saturating_add(1)
                }
                FrameEvent::EntityRemoved { .. } => {
                    counts.removed = counts.removed.saturating_add(1)
                }
                FrameEvent::DoorChanged { .. } => {
                    counts.door_changes = counts.door_changes.saturating_add(1)
                }
                FrameEvent::StateChanged { .. } => {
                    counts.state_changes = counts.state_changes.saturating_add(1)
                }
                FrameEvent::IntentDropped { .. } => {
                    counts.dropped_intents = counts.dropped_intents.saturating_add(1)
                }
                FrameEvent::PlayerHidden { .. } | FrameEvent::Caught { .. } | FrameEvent::LevelWon => {}
            }
        }
        self.last_tick_counts = counts;
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameEvent> {
        self.current_tick_events.iter()
    }

    pub fn as_slice(&self) -> &[FrameEvent] {
        &self.current_tick_events
    }

    pub fn last_tick_counts(&self) -> FrameEventCounts {
        self.last_tick_counts
    }
}
