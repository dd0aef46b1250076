//! Keel Engine Runtime
//!
//! Minimal binary that boots a demo world and drives the simulation loop:
//! a swarm of particles integrating velocity, wrapping at the playfield
//! boundary, and respawning when their lifetime runs out.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use glam::Vec2;
use keel_core::ecs::{SystemDescriptor, Value, World, WorldConfig};
use keel_core::time::{FixedTimestep, SimulationClock, TICK_DT, TICK_DURATION};
use keel_metrics::{SystemProfiler, TickTimer};

/// Demo world description; a host would usually load this from disk.
const WORLD_CONFIG: &str = r#"{
    "max_entities": 1024,
    "components": [
        {
            "name": "Transform",
            "fields": [
                { "name": "x", "kind": "f32" },
                { "name": "y", "kind": "f32" },
                { "name": "rot", "kind": "f32" }
            ]
        },
        {
            "name": "Velocity",
            "fields": [
                { "name": "dx", "kind": "f32" },
                { "name": "dy", "kind": "f32" }
            ]
        },
        {
            "name": "Lifetime",
            "fields": [
                { "name": "remaining", "kind": "f32" }
            ]
        }
    ]
}"#;

const INITIAL_POPULATION: u32 = 256;
const DEMO_TICKS: u64 = 600;

fn seed_entity(world: &mut World, e: u32, angle: f32) -> Result<()> {
    let dir = Vec2::from_angle(angle) * 60.0;
    world
        .entity(e)
        .add(
            "Transform",
            &[("x", Value::F32(500.0)), ("y", Value::F32(500.0))],
        )?
        .add(
            "Velocity",
            &[("dx", Value::F32(dir.x)), ("dy", Value::F32(dir.y))],
        )?
        .add(
            "Lifetime",
            &[("remaining", Value::F32(2.0 + (e % 8) as f32))],
        )?;
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Keel Engine v{}", keel_core::VERSION);

    let config: WorldConfig = serde_json::from_str(WORLD_CONFIG)?;
    let mut world = World::from_config(config)?;
    tracing::info!(
        components = world.component_count(),
        capacity = world.capacity(),
        "world ready"
    );

    for i in 0..INITIAL_POPULATION {
        let e = world.spawn()?;
        let angle = i as f32 / INITIAL_POPULATION as f32 * std::f32::consts::TAU;
        seed_entity(&mut world, e, angle)?;
    }

    let profiler = Rc::new(RefCell::new(SystemProfiler::new()));

    // Movement integrates velocity through raw column references resolved
    // once, up front.
    let xs = world.column("Transform", "x")?;
    let ys = world.column("Transform", "y")?;
    let dxs = world.column("Velocity", "dx")?;
    let dys = world.column("Velocity", "dy")?;
    let prof = profiler.clone();
    world.register_system(
        SystemDescriptor::new("movement")
            .requires("Transform")
            .requires("Velocity"),
        move |proxy, dt, _world| {
            prof.borrow_mut().time("movement", || {
                let e = proxy.eid;
                xs.set_f32(e, xs.f32(e) + dxs.f32(e) * dt);
                ys.set_f32(e, ys.f32(e) + dys.f32(e) * dt);
            })
        },
    )?;

    // Boundary wrap goes through the ergonomic proxy accessors.
    let prof = profiler.clone();
    world.register_system(
        SystemDescriptor::new("boundary").binds("pos", "Transform", &["x", "y"]),
        move |proxy, _dt, _world| {
            prof.borrow_mut().time("boundary", || {
                for axis in ["pos.x", "pos.y"] {
                    let v = proxy.f32(axis);
                    if v < 0.0 {
                        proxy.set_f32(axis, 1000.0);
                    } else if v > 1000.0 {
                        proxy.set_f32(axis, 0.0);
                    }
                }
            })
        },
    )?;

    // Lifetime decays per tick; expired entities despawn and a replacement
    // is seeded in the same tick. Later systems (and the next tick's
    // queries) observe the structural change.
    let prof = profiler.clone();
    world.register_system(
        SystemDescriptor::new("lifetime").binds("life", "Lifetime", &["remaining"]),
        move |proxy, dt, world| {
            prof.borrow_mut().time("lifetime", || {
                let remaining = proxy.f32("life.remaining") - dt;
                if remaining > 0.0 {
                    proxy.set_f32("life.remaining", remaining);
                    return;
                }
                world.despawn(proxy.eid);
                if let Ok(spawned) = world.spawn() {
                    let angle = spawned as f32 * 0.7;
                    if let Err(err) = seed_entity(world, spawned, angle) {
                        tracing::warn!(%err, "failed to seed replacement entity");
                    }
                }
            })
        },
    )?;

    tracing::info!(systems = world.system_count(), "systems registered, running");

    // Headless demo: each loop iteration stands in for one frame of wall
    // time, so the simulation runs as fast as the machine allows.
    let mut timestep = FixedTimestep::default();
    let mut clock = SimulationClock::new();
    let mut timer = TickTimer::new(120, TICK_DURATION);
    while clock.tick_count() < DEMO_TICKS {
        for _ in 0..timestep.advance(TICK_DURATION) {
            timer.begin();
            world.run_systems(TICK_DT);
            timer.end();
            clock.advance_tick();
        }
    }

    let stats = world.stats();
    tracing::info!(
        ticks = clock.tick_count(),
        sim_seconds = clock.total_time().as_secs_f64(),
        live = world.live_count(),
        spawned = stats.spawned,
        despawned = stats.despawned,
        query_refreshes = stats.query_refreshes,
        "simulation complete"
    );
    tracing::info!(
        avg_ms = timer.average_ms(),
        worst_ms = timer.worst_ms(),
        over_budget = timer.over_budget(),
        "tick timing"
    );
    for (name, total, calls) in profiler.borrow().report() {
        tracing::info!(
            system = %name,
            total_ms = total.as_secs_f64() * 1000.0,
            calls,
            "system profile"
        );
    }

    // Hand the replication collaborator its columns.
    let snapshot = world.snapshot("Transform")?;
    tracing::info!(
        entities = snapshot.len(),
        fields = snapshot.fields.len(),
        "transform snapshot ready"
    );

    Ok(())
}
