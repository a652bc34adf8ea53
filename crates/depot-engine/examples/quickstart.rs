//! Depot Quickstart: drive the bundled sample topology with a simple
//! controller.
//!
//! Demonstrates:
//!   1. Building an `Env` from the default `EngineConfig`
//!   2. Stopping at decision points and answering with an `Action`
//!   3. Reading attribute series back out of the snapshot list
//!   4. Resetting and re-running
//!
//! Run with:
//!   RUST_LOG=depot_engine=debug cargo run --example quickstart

use depot_core::{Action, ControlAction, UnitId};
use depot_engine::{EngineConfig, Env};

// ─── Sample topology units ──────────────────────────────────────

const FACTORY: UnitId = UnitId(1);
const SHOP: UnitId = UnitId(21);

// ─── Episode parameters ─────────────────────────────────────────

const DURATIONS: u64 = 40;
const RESOLUTION: u64 = 5;

/// Ramp production up for the first half of the episode, then hold;
/// the shop re-orders a fixed quantity at every decision.
fn controller(decision: u64) -> Action {
    let rate = if decision < 4 { 2 + decision as u32 } else { 0 };
    Action::new()
        .with(FACTORY, ControlAction::Produce { rate })
        .with(SHOP, ControlAction::Buy { quantity: 3 })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== Depot Quickstart ===\n");

    let mut env = Env::new(EngineConfig {
        durations: DURATIONS,
        snapshot_resolution: RESOLUTION,
        ..Default::default()
    })?;

    let summary = env.summary();
    println!(
        "World: {} facilities, {} units, action every {} ticks, {} snapshot slots\n",
        summary.facilities,
        summary.units,
        env.configs().action_steps,
        summary.snapshot_capacity
    );

    let mut decisions = 0u64;
    let mut step = env.step(None)?;
    while !step.done {
        if let Some(decision) = step.decision {
            println!("  decision {} at tick {}", decision.id, decision.tick);
        }
        step = env.step(Some(controller(decisions)))?;
        decisions += 1;
    }
    println!("\nEpisode finished at tick {} after {decisions} decisions", step.tick);

    let layout = env.engine().frame().layout();
    let manufacture = layout.node_kind("manufacture")?;
    let output = layout.attribute(manufacture, "output")?;
    let consumer = layout.node_kind("consumer")?;
    let bought = layout.attribute(consumer, "total_purchased")?;

    let indices = env.snapshot_list().indices();
    let output_series = env.snapshot_list().query(&indices, manufacture, output)?;
    let bought_series = env.snapshot_list().query(&indices, consumer, bought)?;

    println!("\n  index  output  purchased");
    for ((index, out), buy) in indices.iter().zip(&output_series).zip(&bought_series) {
        println!("  {index:>5}  {out:>6.1}  {buy:>9.1}");
    }

    env.reset();
    println!(
        "\nAfter reset: tick {}, {} snapshots",
        env.tick(),
        env.snapshot_list().len()
    );

    Ok(())
}
