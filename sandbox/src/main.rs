//! Headless controller sandbox: walks one agent around a small scene and logs
//! what the controller sees.

mod player;
mod scene;

use clap::Parser;
use kcc::collision::settings::DEFAULT_MOVEMENT_SPEED;
use kcc::state_machine::StateMachine;
use kcc::{
    CollisionGroup, Controller, ControllerSettings, GroupMask, KccError, Point3, QueryFilter, UpdateMode,
};

use player::{Player, PlayerState, early_update, late_update, player_state};
use scene::Scene;

#[derive(Parser, Debug)]
#[command(name = "sandbox")]
#[command(about = "Drive a kinematic character controller through a test scene", long_about = None)]
struct Args {
    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u32,
    /// Frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Run the controller at a fixed rate instead of once per frame
    #[arg(long)]
    fixed_rate: Option<u32>,
    /// Walking speed in meters per second
    #[arg(long, default_value_t = DEFAULT_MOVEMENT_SPEED)]
    speed: f32,
    /// Log a status line every N frames (0 disables)
    #[arg(long, default_value_t = 60)]
    report_every: u32,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), KccError> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    log::info!("starting sandbox: {} frames at {:.4}s", args.frames, args.dt);

    let mut scene = Scene::build()?;

    let settings = ControllerSettings {
        walkable: QueryFilter::new(
            CollisionGroup::Default,
            GroupMask::of(&[CollisionGroup::Default, CollisionGroup::Static, CollisionGroup::Kinematic]),
        ),
        update_mode: match args.fixed_rate {
            Some(updates_per_second) => UpdateMode::Fixed { updates_per_second },
            None => UpdateMode::Variable,
        },
        ..Default::default()
    };
    let mut controller = Controller::new(settings, Point3::new(0.0, 0.5, 0.0))?;

    let waypoints = vec![
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, -5.0),
        Point3::new(-6.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
    ];
    let mut player = Player::new(waypoints, args.speed);
    let mut machine = StateMachine::new(PlayerState::Idle, player_state)
        .with_early_update(early_update)
        .with_late_update(late_update);
    machine.enter_current(&mut player, &mut controller);

    let mut ticks = 0;
    for frame in 0..args.frames {
        scene.advance_platform(frame as f32 * args.dt);
        ticks += controller.update(&mut scene.world, args.dt, |controller, _| {
            machine.super_update(&mut player, controller)
        });

        if args.report_every > 0 && frame % args.report_every == 0 {
            let ground = controller.ground();
            log::info!(
                "frame {frame:>5} {:?} pos {:>7.3?} ground {:?} dist {:.3} grounded {} contacts {}",
                machine.current(),
                controller.position().coords.as_slice(),
                ground.ground_entity(),
                ground.distance(),
                controller.is_grounded(0.05).is_some(),
                controller.collision_data().len(),
            );
        }
    }

    log::info!(
        "done: {ticks} ticks, {} waypoints reached, {} jumps, {} landings, final position {:?}",
        player.next_waypoint,
        player.jumps,
        player.landings,
        controller.position()
    );
    Ok(())
}
