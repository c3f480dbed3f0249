//! The player controller.
//!
//! Each tick runs in a fixed order:
//! 1. Controls: run, jump, roll, slam, then interact and attack
//! 2. Movement: enemy repulsion, the resolver pass and collision response
//!    (or the kinematic ledge pull-up instead of the resolver)
//! 3. Passive updates: decay, drag, gravity, roll and wall timers, vitals
//! 4. Weapon: advance the swing and hit enemies in the window
//!
//! Movement state is a set of independent flags rather than one enum; the
//! presentation [`PlayerState`] is derived from them.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use ashfall_kernel::{move_box, Collision, Direction, Rect};

use crate::attack::AttackTick;
use crate::entity::{Actor, Body, Damageable, EntityRef, Facing};
use crate::events::GameEvent;
use crate::input::{FrameInput, HeldKeys, PlayerControl};
use crate::map::Map;
use crate::physics::{apply_drag, repulsion, triangle_wave, PlayerPhysics};
use crate::simulation::TickContext;
use crate::velocity::{decay, ComposedVelocity};
use crate::vitals::Vitals;
use crate::weapon::{Weapon, WeaponConfig};

/// How hard the roll morph squashes: the box reaches its minimum height a
/// quarter of the way in and stays there until three quarters.
const ROLL_MORPH_GAIN: f64 = 2.0;

/// Roll heights snap to multiples of this so edge sums stay exact.
const HEIGHT_QUANTUM: f64 = 1.0 / 256.0;

/// Horizontal speed below which the player counts as standing still.
const RUN_THRESHOLD: f64 = 5.0;

/// Presentation state derived from the movement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// Standing
    Idle,
    /// Running on the ground
    Running,
    /// Rising
    Jumping,
    /// Falling
    Falling,
    /// Rolling
    Rolling,
    /// Slamming downward
    Slamming,
    /// Sliding down a wall
    WallSliding,
    /// Climbing a wall
    WallClimbing,
    /// Pulling up onto a ledge
    LedgeClimbing,
    /// Swinging the weapon
    Attacking,
    /// Dead
    Dead,
}

/// An active ledge pull-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgeClimb {
    /// Side the ledge is on
    pub side: Facing,
    /// Top of the ledge; the player rises until its bottom reaches it
    pub top: f64,
    /// Left edge the player ends at
    pub target_left: f64,
    /// True once level with the ledge and moving over it
    pub risen: bool,
}

/// Collision responses already applied this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Latches {
    down: bool,
    up: bool,
    side: bool,
}

/// The player.
#[derive(Debug, Clone)]
pub struct Player {
    physics: PlayerPhysics,
    rect: Rect,
    facing: Facing,
    velocity: ComposedVelocity,
    vitals: Vitals,
    weapon: Weapon,
    jumps: u32,
    on_platform: bool,
    slamming: bool,
    roll_time: f64,
    roll_cooldown: f64,
    wall_col_dir: Option<Facing>,
    wall_climb_time: f64,
    wall_climb_available: bool,
    wall_sliding: bool,
    ledge_climb: Option<LedgeClimb>,
    latches: Latches,
}

impl Player {
    /// Spawns a player at the top-left of `spawn`, sized by `physics`.
    #[must_use]
    pub fn new(physics: PlayerPhysics, weapon: WeaponConfig, spawn: &Rect, facing: Facing) -> Self {
        let rect = Rect::new(spawn.left, spawn.top, physics.width, physics.height);
        let vitals = Vitals::new(physics.max_health).with_i_frames(physics.i_frames);
        Self {
            jumps: physics.jumps,
            physics,
            rect,
            facing,
            velocity: ComposedVelocity::default(),
            vitals,
            weapon: Weapon::new(weapon),
            on_platform: false,
            slamming: false,
            roll_time: 0.0,
            roll_cooldown: 0.0,
            wall_col_dir: None,
            wall_climb_time: 0.0,
            wall_climb_available: true,
            wall_sliding: false,
            ledge_climb: None,
            latches: Latches::default(),
        }
    }

    /// Movement tuning.
    #[must_use]
    pub fn physics(&self) -> &PlayerPhysics {
        &self.physics
    }

    /// Facing direction.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Velocity components.
    #[must_use]
    pub fn velocity(&self) -> &ComposedVelocity {
        &self.velocity
    }

    /// Health and timers.
    #[must_use]
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// The weapon.
    #[must_use]
    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    /// Remaining jump charges.
    #[must_use]
    pub fn jumps(&self) -> u32 {
        self.jumps
    }

    /// Standing on a wall or platform.
    #[must_use]
    pub fn on_platform(&self) -> bool {
        self.on_platform
    }

    /// True while a roll is running.
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.roll_time > 0.0
    }

    /// Remaining roll time.
    #[must_use]
    pub fn roll_time(&self) -> f64 {
        self.roll_time
    }

    /// True while slamming.
    #[must_use]
    pub fn is_slamming(&self) -> bool {
        self.slamming
    }

    /// Side of the wall touched this tick, if airborne against one.
    #[must_use]
    pub fn wall_col_dir(&self) -> Option<Facing> {
        self.wall_col_dir
    }

    /// True while actively climbing a wall.
    #[must_use]
    pub fn is_wall_climbing(&self) -> bool {
        self.wall_climb_time > 0.0 && self.wall_col_dir.is_some()
    }

    /// Active ledge pull-up.
    #[must_use]
    pub fn ledge_climb(&self) -> Option<&LedgeClimb> {
        self.ledge_climb.as_ref()
    }

    fn is_wall_hanging(&self) -> bool {
        !self.on_platform && self.wall_col_dir.is_some()
    }

    fn held_toward(held: &HeldKeys, side: Facing) -> bool {
        match side {
            Facing::Left => held.left,
            Facing::Right => held.right,
        }
    }

    /// Advances the player one step.
    pub fn tick(&mut self, input: &FrameInput, map: &mut Map, ctx: &mut TickContext<'_>, dt: f64) {
        if self.vitals.is_dead() {
            return;
        }

        self.handle_controls(input, map, ctx, dt);

        if self.ledge_climb.is_some() {
            self.advance_ledge_climb(&input.held, dt);
        } else {
            self.apply_repulsion(map, dt);
            self.move_and_respond(input, map, ctx, dt);
        }

        self.passive(map, dt);
        self.swing(map, ctx, dt);
    }

    fn handle_controls(&mut self, input: &FrameInput, map: &mut Map, ctx: &mut TickContext<'_>, dt: f64) {
        let controls = &input.controls;

        let dir = i8::from(controls.contains(PlayerControl::Right)) - i8::from(controls.contains(PlayerControl::Left));
        if let Some(climb) = self.ledge_climb {
            if dir != 0 && Facing::from_sign(f64::from(dir)) == Some(climb.side.flipped()) {
                trace!("Ledge climb cancelled by opposite input");
                self.ledge_climb = None;
            }
        }
        if dir != 0 && !self.is_rolling() && self.ledge_climb.is_none() {
            let sprint = if input.held.sprint {
                self.physics.sprint_multiplier
            } else {
                1.0
            };
            self.velocity.controlled_vx += self.physics.control_accel * dt * f64::from(dir) * sprint;
            if let Some(facing) = Facing::from_sign(f64::from(dir)) {
                self.facing = facing;
            }
        }

        if controls.contains(PlayerControl::Jump) {
            self.try_jump(&input.held, map, ctx, dt);
        }

        if controls.contains(PlayerControl::Roll) && !self.is_rolling() && self.roll_cooldown <= 0.0 {
            self.slamming = false;
            self.velocity.slam_vy = 0.0;
            self.roll_time = self.physics.roll_length;
            ctx.events.publish(GameEvent::Rolled);
        }
        if self.is_rolling() {
            self.velocity.roll_vx = self.physics.roll_speed * self.facing.sign();
            self.velocity.controlled_vx = 0.0;
        }

        if controls.contains(PlayerControl::Slam) && !self.slamming && self.stop_rolling(map, dt) {
            self.slamming = true;
            self.velocity.general_vy = 0.0;
            self.velocity.slam_vy = self.physics.slam_strength;
            self.wall_climb_time = 0.0;
            self.ledge_climb = None;
            ctx.events.publish(GameEvent::Slammed);
        }

        if self.slamming || self.is_rolling() || self.is_wall_hanging() || self.ledge_climb.is_some() {
            return;
        }
        if controls.contains(PlayerControl::Interact) {
            self.interact(map, ctx);
        }
        if controls.contains(PlayerControl::AttackStart) && self.weapon.start() {
            ctx.events.publish(GameEvent::AttackStarted { actor: Actor::Player });
        }
        if controls.contains(PlayerControl::AttackStop) && self.weapon.stop() {
            ctx.events.publish(GameEvent::AttackStopped { actor: Actor::Player });
        }
    }

    fn try_jump(&mut self, held: &HeldKeys, map: &mut Map, ctx: &mut TickContext<'_>, dt: f64) {
        if held.down && self.on_platform && map.on_platform(EntityRef::Player, &self.rect) {
            if map.drop_through(EntityRef::Player, &self.rect) {
                self.on_platform = false;
            }
            return;
        }
        if self.slamming || (self.jumps == 0 && self.wall_col_dir.is_none()) {
            return;
        }
        if !self.stop_rolling(map, dt) {
            return;
        }

        self.ledge_climb = None;
        self.velocity.stop_y();
        self.velocity.general_vy = -self.physics.jump_strength;

        match self.wall_col_dir {
            Some(wall) if !self.on_platform => {
                let away = wall.flipped();
                self.velocity.roll_vx = 0.0;
                self.velocity.controlled_vx = self.physics.wall_jump_strength * away.sign();
                self.facing = away;
                self.wall_climb_time = 0.0;
                self.wall_col_dir = None;
                ctx.events.publish(GameEvent::Jumped { wall_jump: true });
            },
            _ => {
                self.jumps = self.jumps.saturating_sub(1);
                ctx.events.publish(GameEvent::Jumped { wall_jump: false });
            },
        }
        self.on_platform = false;
    }

    fn interact(&mut self, map: &mut Map, ctx: &mut TickContext<'_>) {
        for pickup in map.collect_pickups(&self.rect) {
            let healed = self.vitals.heal(pickup.heal());
            debug!("Collected pickup {} for {:.1} health", pickup.id(), healed);
            ctx.events.publish(GameEvent::PickupCollected {
                pickup: pickup.id(),
                heal: healed,
            });
        }
    }

    /// True if the player's full-height box, bottom kept in place, is clear.
    #[must_use]
    pub fn can_stand(&self, map: &Map) -> bool {
        let mut standing = self.rect;
        standing.set_height_keep_bottom(self.physics.height);
        !map.is_blocked(&standing)
    }

    /// Ends a roll early. Fails, extending the roll by `dt`, if there is no
    /// room to stand up. Returns true if the player is not rolling afterwards.
    pub fn stop_rolling(&mut self, map: &Map, dt: f64) -> bool {
        if !self.is_rolling() {
            return true;
        }
        if !self.can_stand(map) {
            self.roll_time += dt;
            trace!("No room to stand, roll extended to {:.3}", self.roll_time);
            return false;
        }
        self.finish_roll();
        true
    }

    fn finish_roll(&mut self) {
        self.roll_time = 0.0;
        self.roll_cooldown = self.physics.roll_cooldown;
        self.rect.set_height_keep_bottom(self.physics.height);
    }

    fn apply_repulsion(&mut self, map: &Map, dt: f64) {
        let me = self.rect.center();
        let mut push = DVec2::ZERO;
        for id in map.enemies_overlapping(&self.rect) {
            let Some(enemy) = map.enemy(id) else {
                continue;
            };
            push += repulsion(
                me,
                enemy.rect().center(),
                self.physics.repulsion_strength,
                self.physics.repulsion_epsilon,
                self.physics.repulsion_cap,
            );
        }
        if push == DVec2::ZERO {
            return;
        }
        self.velocity.set_vx(self.velocity.vx() + push.x * dt);
        if !self.slamming {
            self.velocity.set_vy(self.velocity.vy() + push.y * dt);
        }
    }

    fn move_and_respond(&mut self, input: &FrameInput, map: &mut Map, ctx: &mut TickContext<'_>, dt: f64) {
        self.latches = Latches::default();
        self.wall_col_dir = None;
        self.wall_sliding = false;
        let was_on_platform = self.on_platform;

        let dx = self.velocity.vx() * dt;
        let dy = self.velocity.vy() * dt;
        let collisions = move_box(&mut self.rect, EntityRef::Player, dx, dy, &mut map.obstacles());
        map.release_platforms(EntityRef::Player, &self.rect);

        if dy != 0.0 {
            self.on_platform = collisions.iter().any(|c| c.direction == Direction::Down);
        }

        for collision in &collisions {
            match collision.direction {
                Direction::Down if !self.latches.down => {
                    self.latches.down = true;
                    self.land(was_on_platform, ctx);
                },
                Direction::Up if !self.latches.up => {
                    self.latches.up = true;
                    self.velocity.stop_y();
                },
                Direction::Left | Direction::Right if !self.latches.side && collision.other.is_wall() => {
                    self.latches.side = true;
                    self.hit_wall(collision, &input.held, map, ctx);
                },
                _ => {},
            }
        }
    }

    fn land(&mut self, was_on_platform: bool, ctx: &mut TickContext<'_>) {
        let from_slam = self.slamming;
        self.jumps = self.physics.jumps;
        self.slamming = false;
        self.velocity.stop_y();
        self.wall_climb_time = 0.0;
        self.wall_climb_available = true;
        self.on_platform = true;
        if !was_on_platform {
            trace!("Landed (slam: {})", from_slam);
            ctx.events.publish(GameEvent::Landed {
                actor: Actor::Player,
                from_slam,
            });
        }
    }

    fn hit_wall(&mut self, collision: &Collision<EntityRef>, held: &HeldKeys, map: &Map, ctx: &mut TickContext<'_>) {
        let side = if collision.direction == Direction::Right {
            Facing::Right
        } else {
            Facing::Left
        };
        let wall = collision.other_rect;
        self.velocity.stop_x();

        let airborne = !self.on_platform;
        if airborne {
            self.wall_col_dir = Some(side);
        }
        let holding = Self::held_toward(held, side);
        if !holding {
            return;
        }

        let ledge_offset = self.rect.bottom() - wall.top;
        if ledge_offset > 0.0 && ledge_offset <= self.physics.ledge_climb_height * self.physics.height {
            let target_left = match side {
                Facing::Right => wall.left,
                Facing::Left => wall.right() - self.rect.width,
            };
            if self.ledge_clear(map, wall.top, target_left) {
                debug!("Ledge climb onto ({:.1}, {:.1})", target_left, wall.top);
                self.ledge_climb = Some(LedgeClimb {
                    side,
                    top: wall.top,
                    target_left,
                    risen: false,
                });
                self.velocity.stop_x();
                self.velocity.stop_y();
                self.slamming = false;
                self.wall_climb_time = 0.0;
                ctx.events.publish(GameEvent::LedgeClimbStarted);
                return;
            }
        }

        if airborne {
            if self.wall_climb_available {
                self.wall_climb_available = false;
                self.wall_climb_time = self.physics.wall_climb_length;
            } else if self.wall_climb_time <= 0.0 {
                self.wall_sliding = true;
            }
        }
    }

    /// The pull-up path: straight up beside the ledge, then over onto it.
    fn ledge_clear(&self, map: &Map, top: f64, target_left: f64) -> bool {
        let height = self.physics.height;
        let rise = Rect::new(self.rect.left, top - height, self.rect.width, self.rect.bottom() - (top - height));
        let landing = Rect::new(target_left, top - height, self.rect.width, height);
        !map.is_blocked(&rise) && !map.is_blocked(&landing)
    }

    fn advance_ledge_climb(&mut self, held: &HeldKeys, dt: f64) {
        let Some(climb) = self.ledge_climb else {
            return;
        };
        self.velocity.stop_x();
        self.velocity.stop_y();
        if !Self::held_toward(held, climb.side) {
            trace!("Ledge climb released");
            self.ledge_climb = None;
            return;
        }

        let step = self.physics.ledge_climb_speed * dt;
        if !climb.risen {
            if self.rect.bottom() - climb.top > step {
                self.rect.top -= step;
            } else {
                self.rect.set_bottom(climb.top);
                self.ledge_climb = Some(LedgeClimb { risen: true, ..climb });
            }
            return;
        }
        let remaining = climb.target_left - self.rect.left;
        if remaining.abs() > step {
            self.rect.left += step.copysign(remaining);
        } else {
            self.rect.left = climb.target_left;
            self.ledge_climb = None;
            self.on_platform = true;
            self.jumps = self.physics.jumps;
            self.wall_climb_available = true;
        }
    }

    fn passive(&mut self, map: &Map, dt: f64) {
        if self.ledge_climb.is_none() {
            self.update_velocity(dt);
        }
        self.update_roll(map, dt);
        self.roll_cooldown = (self.roll_cooldown - dt).max(0.0);
        self.wall_climb_time = (self.wall_climb_time - dt).max(0.0);
        self.vitals.tick(dt);
    }

    fn update_velocity(&mut self, dt: f64) {
        let p = &self.physics;
        let v = &mut self.velocity;
        v.controlled_vx = decay(v.controlled_vx, p.controlled_decay, dt);
        v.roll_vx = decay(v.roll_vx, p.roll_decay, dt);
        v.slam_vy = decay(v.slam_vy, p.slam_decay, dt);
        v.general_vy = decay(v.general_vy, p.base_decay, dt);

        v.set_vx(apply_drag(v.vx(), self.rect.height, p.air_resistance, dt));
        v.set_vy(apply_drag(v.vy(), self.rect.width, p.air_resistance, dt));

        let on_wall = self.wall_col_dir.is_some();
        if self.slamming {
            v.general_vy += p.gravity * dt;
        } else if self.wall_climb_time > 0.0 && on_wall {
            v.stop_y();
            v.general_vy = -p.wall_climb_speed;
        } else if self.wall_sliding && on_wall {
            v.general_vy = (v.general_vy + p.gravity * p.wall_slide_gravity * dt).min(p.wall_slide_speed);
        } else {
            v.general_vy = (v.general_vy + p.gravity * dt).min(p.drop_speed_cap);
        }
    }

    fn update_roll(&mut self, map: &Map, dt: f64) {
        if !self.is_rolling() {
            return;
        }
        let remaining = self.roll_time - dt;
        if remaining <= 0.0 {
            if self.can_stand(map) {
                self.finish_roll();
            } else {
                self.roll_time = dt;
            }
            return;
        }

        let progress = 1.0 - remaining / self.physics.roll_length;
        let squash = (ROLL_MORPH_GAIN * triangle_wave(progress)).min(1.0);
        let base = self.physics.height;
        let target = (base - (base - self.physics.roll_min_height) * squash).clamp(self.physics.roll_min_height, base);
        let target = (target / HEIGHT_QUANTUM).round() * HEIGHT_QUANTUM;

        if target > self.rect.height {
            let mut grown = self.rect;
            grown.set_height_keep_bottom(target);
            if map.is_blocked(&grown) {
                // Keeps the roll going until there is headroom
                return;
            }
        }
        self.rect.set_height_keep_bottom(target);
        self.roll_time = remaining;
    }

    fn swing(&mut self, map: &mut Map, ctx: &mut TickContext<'_>, dt: f64) {
        if self.weapon.tick(dt) == AttackTick::Finished {
            ctx.events.publish(GameEvent::AttackStopped { actor: Actor::Player });
        }
        let Some(area) = self.weapon.hit_area(&self.rect, self.facing) else {
            return;
        };
        let damage = ctx.progression.player_damage(self.weapon.config().damage);
        let knockback = self.weapon.config().knockback;
        for id in map.enemies_overlapping(&area) {
            if self.weapon.register_hit(id) {
                map.hit_enemy(id, damage, knockback, self.facing, ctx.events);
            }
        }
    }
}

impl Body for Player {
    type State = PlayerState;

    fn rect(&self) -> Rect {
        self.rect
    }

    fn state(&self) -> PlayerState {
        if self.vitals.is_dead() {
            PlayerState::Dead
        } else if self.ledge_climb.is_some() {
            PlayerState::LedgeClimbing
        } else if self.is_rolling() {
            PlayerState::Rolling
        } else if self.slamming {
            PlayerState::Slamming
        } else if self.weapon.is_swinging() {
            PlayerState::Attacking
        } else if self.is_wall_hanging() {
            if self.wall_climb_time > 0.0 {
                PlayerState::WallClimbing
            } else {
                PlayerState::WallSliding
            }
        } else if !self.on_platform {
            if self.velocity.vy() < 0.0 {
                PlayerState::Jumping
            } else {
                PlayerState::Falling
            }
        } else if self.velocity.vx().abs() > RUN_THRESHOLD {
            PlayerState::Running
        } else {
            PlayerState::Idle
        }
    }
}

impl Damageable for Player {
    fn take_hit(&mut self, damage: f64, knockback: f64, side: Option<Facing>) -> f64 {
        if self.vitals.is_dead() || self.vitals.is_invulnerable() {
            return 0.0;
        }
        let dealt = self.vitals.take_hit(damage);
        if let Some(side) = side {
            self.velocity.set_vx(self.velocity.vx() + side.sign() * knockback);
        }
        dealt
    }

    fn health(&self) -> f64 {
        self.vitals.health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::input::ControlSet;
    use crate::map_data::MapData;
    use crate::progression::Progression;

    const DT: f64 = 1.0 / 60.0;

    struct Rig {
        map: Map,
        bus: EventBus,
        progression: Progression,
    }

    impl Rig {
        fn new(data: &MapData) -> Self {
            Self {
                map: Map::from_data(data, &Progression::default()),
                bus: EventBus::new(1024),
                progression: Progression::default(),
            }
        }

        fn tick(&mut self, player: &mut Player, input: &FrameInput) {
            let mut ctx = TickContext {
                events: &self.bus,
                progression: &mut self.progression,
            };
            player.tick(input, &mut self.map, &mut ctx, DT);
        }
    }

    fn press(controls: &[PlayerControl]) -> FrameInput {
        FrameInput {
            controls: controls.iter().copied().collect::<ControlSet>(),
            held: HeldKeys::default(),
        }
    }

    fn hold_right() -> FrameInput {
        FrameInput::from_held(
            HeldKeys {
                right: true,
                ..HeldKeys::default()
            },
            [],
        )
    }

    fn floor_data() -> MapData {
        MapData::new(800.0, 600.0, Rect::new(100.0, 252.0, 24.0, 48.0)).with_wall(Rect::new(10.0, 300.0, 780.0, 80.0))
    }

    fn standing_player(data: &MapData) -> Player {
        Player::new(PlayerPhysics::default(), WeaponConfig::default(), &data.player_spawn, Facing::Right)
    }

    #[test]
    fn test_rest_on_wall_scenario() {
        let data = floor_data();
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        let g = player.physics().gravity;

        rig.tick(&mut player, &FrameInput::idle());
        assert_eq!(player.velocity().vy(), g * DT);
        assert_eq!(player.rect().bottom(), 300.0);

        for _ in 0..10 {
            rig.tick(&mut player, &FrameInput::idle());
            assert_eq!(player.rect().bottom(), 300.0);
            assert_eq!(player.velocity().vy(), g * DT);
        }
        assert!(player.on_platform());
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_jump_charge_conservation() {
        let data = floor_data();
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        for _ in 0..3 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        assert_eq!(player.jumps(), 2);

        rig.tick(&mut player, &press(&[PlayerControl::Jump]));
        assert_eq!(player.jumps(), 1);
        assert!(player.velocity().vy() < 0.0);
        rig.tick(&mut player, &press(&[PlayerControl::Jump]));
        assert_eq!(player.jumps(), 0);

        // Out of charges: no effect
        let vy = player.velocity().vy();
        rig.tick(&mut player, &press(&[PlayerControl::Jump]));
        assert_eq!(player.jumps(), 0);
        assert!(player.velocity().vy() > vy);

        for _ in 0..240 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        assert!(player.on_platform());
        assert_eq!(player.jumps(), 2);
    }

    #[test]
    fn test_wall_jump_keeps_charges() {
        let data = floor_data().with_wall(Rect::new(300.0, 0.0, 40.0, 200.0));
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.rect = Rect::new(276.0, 100.0, 24.0, 48.0);
        player.jumps = 0;

        rig.tick(&mut player, &hold_right());
        assert_eq!(player.wall_col_dir(), Some(Facing::Right));

        rig.tick(&mut player, &press(&[PlayerControl::Jump]));
        assert_eq!(player.jumps(), 0);
        assert!(player.velocity().controlled_vx < 0.0);
        assert_eq!(player.facing(), Facing::Left);
        assert!(rig.bus.drain().contains(&GameEvent::Jumped { wall_jump: true }));
    }

    #[test]
    fn test_roll_lock_under_ceiling() {
        let data = floor_data().with_wall(Rect::new(80.0, 260.0, 100.0, 16.0));
        let rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.rect = Rect::new(100.0, 276.0, 24.0, 24.0);
        player.roll_time = 0.1;

        assert!(!player.can_stand(&rig.map));
        let before = player.roll_time();
        assert!(!player.stop_rolling(&rig.map, DT));
        assert!(player.roll_time() > before);
        assert_eq!(player.rect().height, 24.0);
    }

    #[test]
    fn test_roll_suppresses_jump_under_ceiling() {
        let data = floor_data().with_wall(Rect::new(80.0, 260.0, 100.0, 16.0));
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.rect = Rect::new(100.0, 276.0, 24.0, 24.0);
        player.on_platform = true;
        player.roll_time = 0.1;

        rig.tick(&mut player, &press(&[PlayerControl::Jump]));
        assert_eq!(player.jumps(), 2);
        assert!(player.is_rolling());
        assert!(player.velocity().vy() >= 0.0);
    }

    #[test]
    fn test_expired_roll_waits_for_headroom() {
        let data = floor_data().with_wall(Rect::new(80.0, 260.0, 100.0, 16.0));
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.rect = Rect::new(100.0, 276.0, 24.0, 24.0);
        player.roll_time = DT / 2.0;

        rig.tick(&mut player, &FrameInput::idle());
        assert!(player.is_rolling());
        assert_eq!(player.roll_time(), DT);
        assert_eq!(player.rect().height, 24.0);
    }

    #[test]
    fn test_roll_outlasts_its_length_in_a_tunnel() {
        let data = floor_data().with_wall(Rect::new(80.0, 260.0, 420.0, 16.0));
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.rect = Rect::new(100.0, 276.0, 24.0, 24.0);

        rig.tick(&mut player, &press(&[PlayerControl::Roll]));
        assert!(player.is_rolling());
        for _ in 0..30 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        assert!(30.0 * DT > player.physics().roll_length);
        assert!(player.rect().right() < 500.0);
        assert!(player.is_rolling());
        assert_eq!(player.rect().height, player.physics().roll_min_height);

        // Keeps rolling until it clears the ceiling
        let mut ticks = 0;
        while player.is_rolling() && ticks < 120 {
            rig.tick(&mut player, &FrameInput::idle());
            ticks += 1;
        }
        assert!(!player.is_rolling());
        assert!(player.rect().left >= 500.0);
        assert_eq!(player.rect().height, player.physics().height);
        assert!((player.rect().bottom() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_roll_runs_its_course() {
        let data = floor_data();
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        for _ in 0..3 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        rig.tick(&mut player, &press(&[PlayerControl::Roll]));
        assert!(player.is_rolling());
        assert!(player.velocity().roll_vx > 0.0);

        let mut min_height = f64::MAX;
        for _ in 0..60 {
            rig.tick(&mut player, &FrameInput::idle());
            min_height = min_height.min(player.rect().height);
            assert!((player.rect().bottom() - 300.0).abs() < 1e-9);
        }
        assert!(!player.is_rolling());
        assert_eq!(player.rect().height, player.physics().height);
        assert!((min_height - player.physics().roll_min_height).abs() < 1e-9);
    }

    #[test]
    fn test_slam_lands_with_flag() {
        let data = floor_data();
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.rect.top = 100.0;

        rig.tick(&mut player, &press(&[PlayerControl::Slam]));
        assert!(player.is_slamming());
        for _ in 0..60 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        assert!(!player.is_slamming());
        assert!(rig.bus.drain().contains(&GameEvent::Landed {
            actor: Actor::Player,
            from_slam: true
        }));
    }

    #[test]
    fn test_drop_through_platform() {
        let data = MapData::new(800.0, 600.0, Rect::new(100.0, 152.0, 24.0, 48.0))
            .with_wall(Rect::new(0.0, 500.0, 800.0, 40.0))
            .with_platform(Rect::new(50.0, 200.0, 200.0, 10.0));
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        for _ in 0..3 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        assert_eq!(player.rect().bottom(), 200.0);

        let drop = FrameInput {
            controls: [PlayerControl::Jump].into_iter().collect(),
            held: HeldKeys {
                down: true,
                ..HeldKeys::default()
            },
        };
        rig.tick(&mut player, &drop);
        assert_eq!(player.jumps(), 2);
        for _ in 0..120 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        assert_eq!(player.rect().bottom(), 500.0);
    }

    #[test]
    fn test_ledge_climb() {
        let data = MapData::new(800.0, 600.0, Rect::new(176.0, 242.0, 24.0, 48.0))
            .with_wall(Rect::new(0.0, 400.0, 800.0, 40.0))
            .with_wall(Rect::new(200.0, 270.0, 200.0, 130.0));
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);

        rig.tick(&mut player, &hold_right());
        assert!(player.ledge_climb().is_some());
        assert!(rig.bus.drain().contains(&GameEvent::LedgeClimbStarted));

        for _ in 0..30 {
            if player.ledge_climb().is_none() {
                break;
            }
            rig.tick(&mut player, &hold_right());
        }
        assert!(player.ledge_climb().is_none());
        assert_eq!(player.rect().left, 200.0);
        assert!((player.rect().bottom() - 270.0).abs() < 1.0);
    }

    #[test]
    fn test_interact_heals() {
        let data = floor_data().with_pickup(100.0, 288.0, 30.0);
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        player.take_hit(50.0, 0.0, None);

        rig.tick(&mut player, &press(&[PlayerControl::Interact]));
        assert_eq!(player.health(), 80.0);
        assert_eq!(rig.map.pickups().count(), 0);
    }

    #[test]
    fn test_attack_hits_enemy_once() {
        let data = floor_data().with_enemy(crate::enemy::EnemyKind::Brute, 130.0, 200.0);
        let mut rig = Rig::new(&data);
        let mut player = standing_player(&data);
        let enemy_id = rig.map.enemies().next().map(|e| e.id()).expect("enemy spawned");
        let start = rig.map.enemy(enemy_id).map(Damageable::health).unwrap_or_default();

        rig.tick(&mut player, &press(&[PlayerControl::AttackStart]));
        for _ in 0..30 {
            rig.tick(&mut player, &FrameInput::idle());
        }
        let after = rig.map.enemy(enemy_id).map(Damageable::health).unwrap_or_default();
        assert!((start - after - player.weapon().config().damage).abs() < 1e-9);
    }

    #[test]
    fn test_player_knockback_and_i_frames() {
        let data = floor_data();
        let mut player = standing_player(&data);
        assert_eq!(player.take_hit(10.0, 200.0, Some(Facing::Left)), 10.0);
        assert_eq!(player.velocity().vx(), -200.0);
        assert_eq!(player.take_hit(10.0, 200.0, Some(Facing::Left)), 0.0);
    }
}
