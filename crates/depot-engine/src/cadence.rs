//! Tick cadence arithmetic.
//!
//! Pure functions shared by the engine, the driver, and replay tooling.
//! `action_steps`, `resolution` and `max_tick` are validated to be at
//! least 1 before any of these run.

use depot_core::TickId;

/// Snapshot index that tick `t` falls into: `t / resolution`.
pub fn frame_index(tick: TickId, resolution: u64) -> u64 {
    tick.0 / resolution
}

/// Whether `step(t)` emits a decision event.
pub fn is_decision_tick(tick: TickId, action_steps: u64) -> bool {
    tick.0 % action_steps == 0
}

/// Whether `post_step(t)` takes a snapshot.
///
/// `u64::MAX` has no successor and never closes a window.
pub fn is_snapshot_tick(tick: TickId, resolution: u64) -> bool {
    tick.0
        .checked_add(1)
        .is_some_and(|next| next % resolution == 0)
}

/// Whether `t` is the last tick of an episode of `max_tick` ticks.
pub fn is_episode_done(tick: TickId, max_tick: u64) -> bool {
    tick.0.checked_add(1) == Some(max_tick)
}

/// Snapshots needed to hold a full episode: `ceil(max_tick / resolution)`.
pub fn calc_max_snapshots(max_tick: u64, resolution: u64) -> usize {
    max_tick.div_ceil(resolution).max(1) as usize
}
