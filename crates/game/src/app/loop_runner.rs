use std::time::Duration;

use engine::sim::FrameEventCounts;
use engine::{
    AudioSink, Camera2D, FrameEvent, FrameEvents, GestureClassifier, IntentCollector,
    LevelSession, LevelStatus, SoundCue,
};
use tracing::{debug, info};

use super::bootstrap::HostConfig;
use super::script::{InputScript, ScriptPlayer};

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub(crate) max_ticks: u32,
    pub(crate) host: HostConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RunReport {
    pub(crate) ticks: u32,
    pub(crate) status: LevelStatus,
    pub(crate) state: &'static str,
    pub(crate) totals: FrameEventCounts,
    pub(crate) sounds: Vec<SoundCue>,
}

/// Audio stand-in for headless runs: logs each cue and keeps the history.
#[derive(Debug, Default)]
struct LoggingAudio {
    played: Vec<SoundCue>,
}

impl AudioSink for LoggingAudio {
    fn play(&mut self, cue: SoundCue) {
        debug!(cue = cue.asset_key(), "sound_cue");
        self.played.push(cue);
    }
}

fn fixed_dt(target_tps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(target_tps.max(1)))
}

fn tick_start_ms(tick: u32, target_tps: u32) -> u64 {
    u64::from(tick) * 1000 / u64::from(target_tps.max(1))
}

fn accumulate(totals: &mut FrameEventCounts, tick: FrameEventCounts) {
    totals.moved = totals.moved.saturating_add(tick.moved);
    totals.removed = totals.removed.saturating_add(tick.removed);
    totals.door_changes = totals.door_changes.saturating_add(tick.door_changes);
    totals.state_changes = totals.state_changes.saturating_add(tick.state_changes);
    totals.dropped_intents = totals.dropped_intents.saturating_add(tick.dropped_intents);
}

fn log_frame_events(tick: u32, events: &FrameEvents) {
    for event in events.iter() {
        match event {
            FrameEvent::StateChanged { from, to } => {
                info!(tick, from = from.name(), to = to.name(), "state_changed");
            }
            FrameEvent::Caught { by } => info!(tick, by = by.0, "run_caught"),
            FrameEvent::LevelWon => info!(tick, "run_won"),
            FrameEvent::DoorChanged { id, open } => debug!(tick, door_id = id.0, open, "door_changed"),
            FrameEvent::EntityRemoved { id } => debug!(tick, entity_id = id.0, "entity_removed"),
            FrameEvent::IntentDropped { reason } => debug!(tick, reason = ?reason, "intent_dropped"),
            FrameEvent::PlayerHidden { hidden } => debug!(tick, hidden, "player_hidden"),
            FrameEvent::EntityMoved { .. } | FrameEvent::PlayerMoved { .. } => {}
        }
    }
}

/// Drives a session at a fixed tick rate, replaying the script through the
/// same gesture and intent pipeline a touch device would use. Stops early
/// once the level is over and the script has nothing left to deliver.
pub(crate) fn run_session(
    session: &mut LevelSession,
    script: Option<InputScript>,
    options: &RunOptions,
) -> RunReport {
    let host = &options.host;
    let viewport = script
        .as_ref()
        .and_then(|script| script.viewport)
        .unwrap_or(host.viewport);
    let dt = fixed_dt(host.target_tps).as_secs_f32();

    let mut gestures = GestureClassifier::new(host.gestures.clone(), viewport);
    let mut intents = IntentCollector::new();
    let mut camera = Camera2D::default();
    camera.follow(session.actor_position());
    let mut player = ScriptPlayer::new(script.unwrap_or_default());
    let mut audio = LoggingAudio::default();
    let mut totals = FrameEventCounts::default();
    let mut ticks = 0u32;

    info!(
        level = session.level_index(),
        max_ticks = options.max_ticks,
        tps = host.target_tps,
        viewport_width = viewport.width,
        viewport_height = viewport.height,
        "run_started"
    );

    for tick in 0..options.max_ticks {
        player.feed_until(
            tick_start_ms(tick, host.target_tps),
            &mut gestures,
            &mut intents,
        );
        let frame = gestures.take_frame();
        intents.absorb_gestures(&frame, &mut camera, viewport);
        let snapshot = intents.snapshot_for_tick();

        let events = session.tick(dt, &snapshot, &mut audio);
        accumulate(&mut totals, events.last_tick_counts());
        log_frame_events(tick, events);
        ticks = tick.saturating_add(1);

        if host.camera_follows_actor {
            camera.follow(session.actor_position());
        }
        if session.status() != LevelStatus::Playing && player.is_finished() {
            break;
        }
    }

    RunReport {
        ticks,
        status: session.status(),
        state: session.state().name(),
        totals,
        sounds: audio.played,
    }
}
