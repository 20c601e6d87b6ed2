use kcc::collision::settings::GRAVITY_MPS2;
use kcc::geometry::{angle_deg, bounded_interpolation, jump_speed};
use kcc::state_machine::StateHandlers;
use kcc::{Controller, Point3, walk_toward};

/// Grounded within this distance counts as standing.
const GROUND_THRESHOLD: f32 = 0.05;
const IDLE_TIME_S: f32 = 0.5;
/// Walk speed multiplier per ground slope band (degrees).
const SLOPE_BANDS_DEG: [f32; 2] = [15.0, 30.0];
const SLOPE_SPEED_SCALE: [f32; 3] = [1.0, 0.75, 0.5];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Walk,
    Jump,
    Fall,
}

/// Game-side state the handlers share.
pub struct Player {
    pub waypoints: Vec<Point3>,
    pub next_waypoint: usize,
    pub walk_speed: f32,
    pub jump_height: f32,
    pub vertical_speed: f32,
    pub idle_time: f32,
    pub jumps: u32,
    pub landings: u32,
}

impl Player {
    pub fn new(waypoints: Vec<Point3>, walk_speed: f32) -> Self {
        Self {
            waypoints,
            next_waypoint: 0,
            walk_speed,
            jump_height: 1.0,
            vertical_speed: 0.0,
            idle_time: 0.0,
            jumps: 0,
            landings: 0,
        }
    }

    fn target(&self) -> Option<Point3> {
        if self.waypoints.is_empty() {
            None
        } else {
            Some(self.waypoints[self.next_waypoint % self.waypoints.len()])
        }
    }

    fn advance_waypoint(&mut self) {
        self.next_waypoint += 1;
    }
}

pub fn player_state(state: PlayerState) -> StateHandlers<PlayerState, Player> {
    match state {
        PlayerState::Idle => StateHandlers {
            enter: Some(idle_enter),
            update: Some(idle_update),
            exit: None,
        },
        PlayerState::Walk => StateHandlers::update(walk_update),
        PlayerState::Jump => StateHandlers {
            enter: Some(jump_enter),
            update: Some(airborne_update),
            exit: None,
        },
        PlayerState::Fall => StateHandlers {
            enter: Some(fall_enter),
            update: Some(airborne_update),
            exit: Some(fall_exit),
        },
    }
}

/// Runs before every state update. Landing cancels downward speed.
pub fn early_update(player: &mut Player, controller: &mut Controller) {
    if player.vertical_speed < 0.0 && controller.is_grounded(GROUND_THRESHOLD).is_some() {
        player.vertical_speed = 0.0;
    }
}

/// Runs after every state update; applies vertical motion.
pub fn late_update(player: &mut Player, controller: &mut Controller) {
    let dt = controller.delta_time();
    let up = controller.up();
    controller.translate(up * (player.vertical_speed * dt));
}

fn idle_enter(player: &mut Player, controller: &mut Controller) {
    player.idle_time = 0.0;
    controller.enable_clamping();
    controller.enable_slope_limit();
}

fn idle_update(player: &mut Player, controller: &mut Controller) -> Option<PlayerState> {
    if controller.is_grounded(GROUND_THRESHOLD).is_none() {
        return Some(PlayerState::Fall);
    }
    player.idle_time += controller.delta_time();
    (player.idle_time >= IDLE_TIME_S && player.target().is_some()).then_some(PlayerState::Walk)
}

fn walk_update(player: &mut Player, controller: &mut Controller) -> Option<PlayerState> {
    if controller.is_grounded(GROUND_THRESHOLD).is_none() {
        return Some(PlayerState::Fall);
    }
    let target = player.target()?;
    let slope = angle_deg(&controller.ground().primary_normal(), &controller.up());
    let scale = bounded_interpolation(&SLOPE_BANDS_DEG, &SLOPE_SPEED_SCALE, slope).unwrap_or(1.0);
    let step = walk_toward(controller, target, player.walk_speed * scale, controller.delta_time());
    controller.translate(step.desired_translation);
    if step.finished {
        player.advance_waypoint();
        // Every second waypoint is celebrated with a jump.
        return Some(if player.next_waypoint % 2 == 0 {
            PlayerState::Jump
        } else {
            PlayerState::Idle
        });
    }
    None
}

fn jump_enter(player: &mut Player, controller: &mut Controller) {
    player.jumps += 1;
    player.vertical_speed = jump_speed(player.jump_height, GRAVITY_MPS2);
    controller.disable_clamping();
    controller.disable_slope_limit();
}

fn fall_enter(_: &mut Player, controller: &mut Controller) {
    controller.disable_clamping();
    controller.disable_slope_limit();
}

fn fall_exit(player: &mut Player, _: &mut Controller) {
    player.landings += 1;
}

fn airborne_update(player: &mut Player, controller: &mut Controller) -> Option<PlayerState> {
    player.vertical_speed -= GRAVITY_MPS2 * controller.delta_time();
    let falling = player.vertical_speed <= 0.0;
    if falling && controller.is_grounded(GROUND_THRESHOLD).is_some() {
        player.vertical_speed = 0.0;
        return Some(PlayerState::Idle);
    }
    if player.vertical_speed < 0.0 && controller.ground().distance() > GROUND_THRESHOLD {
        return Some(PlayerState::Fall);
    }
    None
}
