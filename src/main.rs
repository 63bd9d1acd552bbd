#![cfg(not(target_arch = "wasm32"))]

use std::backtrace::Backtrace;
use std::fs::{self, File};
use std::io::{self, Write};
use std::panic;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{error, info, LevelFilter};
use serde_json::Value;

use slop_physics::{
    Collider, Component, FixedTimestep, PhysicsVector, PhysicsWorld, RigidBodyDesc, Scene, StepStats,
};

/// Simulated frames when none is given on the command line.
const DEFAULT_FRAMES: u32 = 180;
const CRASH_LOG: &str = "physics_crash.log";

fn main() {
    setup_diagnostics();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let scene_path = args.next();
    let frames = match args.next() {
        Some(n) => n.parse::<u32>().with_context(|| format!("frame count `{}` is not a number", n))?,
        None => DEFAULT_FRAMES,
    };

    let Some(path) = scene_path else {
        info!("No scene given, running the built-in 3D drop test.");
        let scene = drop_test_scene::<glam::Vec3>()?;
        return simulate(scene, frames);
    };

    let json = fs::read_to_string(&path).with_context(|| format!("reading scene `{}`", path))?;
    let is_3d = serde_json::from_str::<Value>(&json)
        .with_context(|| format!("parsing scene `{}`", path))?
        .get("is_3d")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if is_3d {
        simulate(Scene::<glam::Vec3>::from_json_str(&json)?, frames)
    } else {
        simulate(Scene::<glam::Vec2>::from_json_str(&json)?, frames)
    }
}

/// Step `scene` at 60 Hz for `frames` frames and report where everything
/// ended up.
fn simulate<V: PhysicsVector>(mut scene: Scene<V>, frames: u32) -> Result<()> {
    if scene.is_empty() {
        bail!("scene `{}` has no objects", scene.name);
    }
    info!(
        "Simulating {} scene `{}` ({} objects) for {} frames",
        V::LABEL,
        scene.name,
        scene.len(),
        frames
    );

    let mut world = PhysicsWorld::<V>::new();
    let mut timestep = FixedTimestep::default();
    let mut totals = StepStats::default();
    let mut events = 0usize;

    slop_physics::timed!("simulation", {
        for _ in 0..frames {
            timestep.accumulate(timestep.fixed_dt());
            for dt in timestep.steps() {
                let stats = world.step(dt, &mut scene);
                totals.contacts += stats.contacts;
                totals.ground_contacts += stats.ground_contacts;
                totals.unresolved += stats.unresolved;
                totals.events_dropped += stats.events_dropped;
                totals.step_time_ms += stats.step_time_ms;
            }
            events += world.drain_events().len();
        }
    });

    for obj in scene.objects() {
        match world.body(obj.id()) {
            Some(body) => info!(
                "{:>12} pos={:?} vel={:?} grounded={}",
                obj.name,
                obj.position,
                body.velocity(),
                body.is_grounded()
            ),
            None => info!("{:>12} pos={:?} (no body)", obj.name, obj.position),
        }
    }

    totals.bodies_integrated = world.last_stats().bodies_integrated;
    totals.pairs_tested = world.last_stats().pairs_tested;
    info!(
        "{} steps, {} events: {}",
        world.total_steps(),
        events,
        serde_json::to_string(&totals)?
    );
    Ok(())
}

/// A static floor with three boxes dropped onto it at different heights.
fn drop_test_scene<V: PhysicsVector>() -> Result<Scene<V>> {
    let mut scene = Scene::new("drop_test");
    let up = V::DEFAULT_UP;

    let floor = scene.spawn("floor", V::zero());
    let floor_size = V::splat(20.0) - up.abs() * 19.0;
    if let Some(obj) = scene.get_mut(floor) {
        obj.add_component(Component::RigidBody(RigidBodyDesc {
            mass: 0.0,
            is_dynamic: false,
            ..RigidBodyDesc::default()
        }));
        obj.add_component(Component::BoxCollider(Collider::from_size(floor_size, V::zero())?));
    }

    for (i, height) in [2.0f32, 4.0, 7.0].into_iter().enumerate() {
        let offset = V::unit_axis(0, 1.0) * (i as f32 * 0.6);
        let id = scene.spawn(format!("box_{}", i), up * height + offset);
        if let Some(obj) = scene.get_mut(id) {
            obj.add_component(Component::RigidBody(RigidBodyDesc {
                mass: 1.0 + i as f32,
                restitution: 0.4,
                ..RigidBodyDesc::default()
            }));
            obj.add_component(Component::BoxCollider(Collider::from_size(V::one(), V::zero())?));
        }
    }
    Ok(scene)
}

/// Sets up logging and crash reporting
fn setup_diagnostics() {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_timestamp_millis()
        .format_target(false)
        .parse_default_env()
        .init();

    panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();

        let msg = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<dyn Any>",
            },
        };

        let location = panic_info
            .location()
            .map_or("Unknown location".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));

        let crash_msg = format!(
            "=== PHYSICS CRASH ===\nReason: {}\nLocation: {}\n\nStack Trace:\n{}",
            msg, location, backtrace
        );
        eprintln!("\x1b[31;1m{}\x1b[0m", crash_msg);

        match write_crash_log(Path::new(CRASH_LOG), &crash_msg) {
            Ok(()) => eprintln!("Crash report saved to {}", CRASH_LOG),
            Err(e) => eprintln!("Could not write {}: {}", CRASH_LOG, e),
        }
    }));
}

fn write_crash_log(path: &Path, crash_msg: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(crash_msg.as_bytes())
}
