//! Enemies.
//!
//! An enemy is a body plus three strategies picked by its kind: how it moves,
//! how it senses the player and what its attack hits. On top of those sit the
//! parts every enemy shares:
//! - An alert machine (`Idle -> Alerting -> Alerted`, `Dead` is terminal)
//! - An [`AttackTimer`] driving windup, damage window and cooldown
//! - [`Vitals`] with stagger and invulnerability frames
//! - Gravity, knockback and patrol-bounded walking through the resolver

pub mod kinds;
pub mod movement;
pub mod patrol;
pub mod sense;
pub mod shapes;

pub use kinds::*;
pub use movement::*;
pub use patrol::*;
pub use sense::*;
pub use shapes::*;

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use ashfall_common::EntityId;
use ashfall_kernel::{move_box, CollisionQuery, Direction, Rect};

use crate::attack::{AttackPhase, AttackTick, AttackTimer};
use crate::entity::{Actor, Body, Damageable, EntityRef, Facing};
use crate::events::{EventBus, GameEvent};
use crate::progression::Progression;
use crate::velocity::decay;
use crate::vitals::Vitals;

/// Knockback speed decay rate.
pub const KNOCKBACK_DECAY: f64 = 8.0;

/// Knockback below this speed is dropped.
const KNOCKBACK_REST: f64 = 1.0;

/// Alert machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlertState {
    /// Unaware of the player
    #[default]
    Idle,
    /// Has seen the player and is about to react
    Alerting,
    /// Engaging the player
    Alerted,
    /// Terminal
    Dead,
}

/// What a renderer draws for an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyPose {
    /// Standing still
    Idle,
    /// Walking
    Walking,
    /// Noticed the player
    Alerting,
    /// Preparing a swing
    Windup,
    /// Damage window open
    Attacking,
    /// Reeling from a hit
    Staggered,
    /// Dead
    Dead,
}

/// Kinematic state shared by all enemy strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyBody {
    /// Current box
    pub rect: Rect,
    /// Facing direction
    pub facing: Facing,
    /// Walking speed chosen by the movement strategy
    pub vx: f64,
    /// Horizontal speed from knockback
    pub knockback_vx: f64,
    /// Vertical speed
    pub vy: f64,
    /// Standing on something since the last move
    pub on_ground: bool,
    /// Where the enemy may walk
    pub patrol: PatrolArea,
}

impl EnemyBody {
    /// Creates a body at rest.
    #[must_use]
    pub fn new(rect: Rect, facing: Facing, patrol: PatrolArea) -> Self {
        Self {
            rect,
            facing,
            vx: 0.0,
            knockback_vx: 0.0,
            vy: 0.0,
            on_ground: false,
            patrol,
        }
    }
}

/// A landed enemy attack, to be applied to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Damage after multipliers
    pub damage: f64,
    /// Knockback speed
    pub knockback: f64,
    /// Direction the hit pushes toward
    pub side: Facing,
}

/// What an enemy can observe while thinking.
pub struct EnemyContext<'a> {
    /// The player's box
    pub target: &'a Rect,
    /// Line of sight through the map
    pub sight: &'a dyn SightQuery,
    /// Hook events
    pub events: &'a EventBus,
}

/// A live enemy.
#[derive(Debug)]
pub struct Enemy {
    id: EntityId,
    kind: EnemyKind,
    body: EnemyBody,
    vitals: Vitals,
    movement: Box<dyn Movement>,
    sense: Box<dyn Sense>,
    shape: Box<dyn AttackShape>,
    attack: AttackTimer,
    damage: f64,
    knockback: f64,
    gravity: f64,
    fall_speed_cap: f64,
    alert: AlertState,
    alert_timer: f64,
    alert_delay: f64,
    alert_retain_length: f64,
    score: u64,
    drop_chance: f64,
}

impl Enemy {
    /// Builds an enemy of `kind` from its default template.
    #[must_use]
    pub fn spawn(id: EntityId, kind: EnemyKind, rect: Rect, facing: Facing, patrol: PatrolArea, progression: &Progression) -> Self {
        Self::from_template(id, kind, &kind.template(), rect, facing, patrol, progression)
    }

    /// Builds an enemy from an explicit template. `rect` should already be
    /// placed (see [`find_patrol_area`]).
    #[must_use]
    pub fn from_template(
        id: EntityId,
        kind: EnemyKind,
        template: &EnemyTemplate,
        rect: Rect,
        facing: Facing,
        patrol: PatrolArea,
        progression: &Progression,
    ) -> Self {
        let health = progression.enemy_health(template.health);
        debug!("Spawning {:?} {} with {:.1} health", kind, id, health);
        Self {
            id,
            kind,
            body: EnemyBody::new(rect, facing, patrol),
            vitals: Vitals::new(health)
                .with_stagger(template.stagger_length)
                .with_i_frames(template.i_frames),
            movement: template.movement.build(),
            sense: template.sense.build(),
            shape: template.shape.build(),
            attack: AttackTimer::new(template.timing),
            damage: progression.enemy_damage(template.damage),
            knockback: template.knockback,
            gravity: template.gravity,
            fall_speed_cap: template.fall_speed_cap,
            alert: AlertState::Idle,
            alert_timer: 0.0,
            alert_delay: template.alert_delay,
            alert_retain_length: template.alert_retain_length,
            score: template.score,
            drop_chance: template.drop_chance,
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Grid reference for this enemy.
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Enemy(self.id)
    }

    /// Kind.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Kinematic state.
    #[must_use]
    pub fn body(&self) -> &EnemyBody {
        &self.body
    }

    /// Health and timers.
    #[must_use]
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Alert state.
    #[must_use]
    pub fn alert(&self) -> AlertState {
        self.alert
    }

    /// Attack timer.
    #[must_use]
    pub fn attack(&self) -> &AttackTimer {
        &self.attack
    }

    /// Damage per landed swing.
    #[must_use]
    pub fn damage(&self) -> f64 {
        self.damage
    }

    /// Score awarded for the kill.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Chance of dropping a pickup on death.
    #[must_use]
    pub fn drop_chance(&self) -> f64 {
        self.drop_chance
    }

    /// Region the enemy can currently sense.
    #[must_use]
    pub fn sense_coverage(&self) -> Rect {
        self.sense.coverage(&self.body)
    }

    /// Current hitbox, while the damage window is open.
    #[must_use]
    pub fn hitbox(&self) -> Option<Rect> {
        self.attack
            .progress()
            .map(|progress| self.shape.real_area(&self.body, progress))
    }

    /// Senses the player, advances the alert machine and the attack.
    ///
    /// Returns a strike when the damage window overlaps the player for the
    /// first time this swing.
    pub fn think(&mut self, ctx: &EnemyContext<'_>, dt: f64) -> Option<Strike> {
        if self.alert == AlertState::Dead {
            return None;
        }
        self.vitals.tick(dt);

        let sees = self.sense.detects(&self.body, ctx.target, ctx.sight);
        self.update_alert(sees, ctx.events, dt);
        if matches!(self.alert, AlertState::Alerting | AlertState::Alerted) && !self.attack.phase().is_swinging() {
            self.body.facing = Facing::toward(&self.body.rect, ctx.target);
        }

        let actor = Actor::Enemy(self.id);
        if self.vitals.is_staggered() {
            if self.attack.interrupt() {
                trace!("Enemy {} swing interrupted by stagger", self.id);
                ctx.events.publish(GameEvent::AttackStopped { actor });
            }
            self.attack.tick(dt);
            return None;
        }

        if self.attack.tick(dt) == AttackTick::Finished {
            ctx.events.publish(GameEvent::AttackStopped { actor });
        }

        if self.alert == AlertState::Alerted
            && self.attack.phase() == AttackPhase::Idle
            && self.shape.nominal_area(&self.body).overlaps(ctx.target)
            && self.attack.start()
        {
            ctx.events.publish(GameEvent::AttackStarted { actor });
        }

        let progress = self.attack.progress()?;
        if self.attack.hit_landed() || !self.shape.real_area(&self.body, progress).overlaps(ctx.target) {
            return None;
        }
        self.attack.mark_hit();
        Some(Strike {
            damage: self.damage,
            knockback: self.knockback,
            side: self.body.facing,
        })
    }

    fn update_alert(&mut self, sees: bool, events: &EventBus, dt: f64) {
        match self.alert {
            AlertState::Idle => {
                if sees {
                    self.alert = AlertState::Alerting;
                    self.alert_timer = self.alert_delay;
                    debug!("Enemy {} noticed the player", self.id);
                    if self.alert_timer <= 0.0 {
                        self.become_alerted(events);
                    }
                }
            },
            AlertState::Alerting => {
                if !sees {
                    self.alert = AlertState::Idle;
                    return;
                }
                self.alert_timer -= dt;
                if self.alert_timer <= 0.0 {
                    self.become_alerted(events);
                }
            },
            AlertState::Alerted => {
                if sees {
                    self.alert_timer = self.alert_retain_length;
                } else {
                    self.alert_timer -= dt;
                    if self.alert_timer <= 0.0 {
                        debug!("Enemy {} lost the player", self.id);
                        self.alert = AlertState::Idle;
                    }
                }
            },
            AlertState::Dead => {},
        }
    }

    fn become_alerted(&mut self, events: &EventBus) {
        self.alert = AlertState::Alerted;
        self.alert_timer = self.alert_retain_length;
        debug!("Enemy {} alerted", self.id);
        events.publish(GameEvent::Alerted { enemy: self.id });
    }

    /// Lets the movement strategy choose a walking speed.
    pub fn steer(&mut self, target: &Rect, rng: &mut Rng, dt: f64) {
        if self.alert == AlertState::Dead || self.vitals.is_staggered() {
            self.body.vx = 0.0;
            return;
        }
        let intent = SteerIntent {
            alert: self.alert,
            attacking: self.attack.phase().is_swinging(),
            target_left: target.center_x() - self.body.rect.width / 2.0,
        };
        self.body.vx = self.movement.steer(&self.body, &intent, rng, dt);
        if self.alert == AlertState::Idle {
            if let Some(facing) = Facing::from_sign(self.body.vx) {
                self.body.facing = facing;
            }
        }
    }

    /// Applies gravity and knockback and moves through the resolver.
    ///
    /// Horizontal motion never leaves the patrol area.
    pub fn integrate<Q>(&mut self, query: &mut Q, dt: f64)
    where
        Q: CollisionQuery<EntityRef> + ?Sized,
    {
        let body = &mut self.body;
        body.vy = (body.vy + self.gravity * dt).min(self.fall_speed_cap);

        let wanted = body.rect.left + (body.vx + body.knockback_vx) * dt;
        let dx = body.patrol.clamp(wanted) - body.rect.left;
        let dy = body.vy * dt;

        body.on_ground = false;
        for collision in move_box(&mut body.rect, EntityRef::Enemy(self.id), dx, dy, query) {
            match collision.direction {
                Direction::Down => {
                    body.vy = 0.0;
                    body.on_ground = true;
                },
                Direction::Up => body.vy = 0.0,
                Direction::Left | Direction::Right => body.knockback_vx = 0.0,
            }
        }

        body.knockback_vx = decay(body.knockback_vx, KNOCKBACK_DECAY, dt);
        if body.knockback_vx.abs() < KNOCKBACK_REST {
            body.knockback_vx = 0.0;
        }
    }
}

impl Body for Enemy {
    type State = EnemyPose;

    fn rect(&self) -> Rect {
        self.body.rect
    }

    fn state(&self) -> EnemyPose {
        if self.alert == AlertState::Dead {
            return EnemyPose::Dead;
        }
        if self.vitals.is_staggered() {
            return EnemyPose::Staggered;
        }
        match self.attack.phase() {
            AttackPhase::Windup => EnemyPose::Windup,
            AttackPhase::Active => EnemyPose::Attacking,
            AttackPhase::Idle | AttackPhase::Cooldown => {
                if self.alert == AlertState::Alerting {
                    EnemyPose::Alerting
                } else if self.body.vx != 0.0 {
                    EnemyPose::Walking
                } else {
                    EnemyPose::Idle
                }
            },
        }
    }
}

impl Damageable for Enemy {
    fn take_hit(&mut self, damage: f64, knockback: f64, side: Option<Facing>) -> f64 {
        if self.alert == AlertState::Dead || self.vitals.is_invulnerable() {
            return 0.0;
        }
        let dealt = self.vitals.take_hit(damage);
        if let Some(side) = side {
            self.body.knockback_vx += side.sign() * knockback;
        }
        if self.vitals.is_dead() {
            debug!("Enemy {} killed", self.id);
            self.alert = AlertState::Dead;
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
    use crate::attack::AttackTiming;
    use glam::DVec2;

    struct ClearSight;

    impl SightQuery for ClearSight {
        fn line_blocked(&self, _from: DVec2, _to: DVec2) -> bool {
            false
        }
    }

    fn template() -> EnemyTemplate {
        EnemyTemplate {
            health: 50.0,
            damage: 10.0,
            knockback: 200.0,
            stagger_length: 0.3,
            i_frames: 0.5,
            alert_delay: 0.2,
            alert_retain_length: 1.0,
            timing: AttackTiming::new(0.1, 0.2, 0.5),
            sense: SenseKind::Rect {
                range: 200.0,
                height: 60.0,
                xray: false,
            },
            shape: ShapeKind::Slash {
                reach: 40.0,
                height: 40.0,
            },
            ..EnemyTemplate::default()
        }
    }

    fn enemy() -> Enemy {
        Enemy::from_template(
            EntityId::from_raw(7),
            EnemyKind::Grunt,
            &template(),
            Rect::new(100.0, 100.0, 20.0, 40.0),
            Facing::Right,
            PatrolArea::new(0.0, 300.0),
            &Progression::default(),
        )
    }

    fn run(enemy: &mut Enemy, target: &Rect, bus: &EventBus, seconds: f64) -> Vec<Strike> {
        let ctx = EnemyContext {
            target,
            sight: &ClearSight,
            events: bus,
        };
        let mut strikes = Vec::new();
        let steps = (seconds / 0.01).round() as usize;
        for _ in 0..steps {
            strikes.extend(enemy.think(&ctx, 0.01));
        }
        strikes
    }

    #[test]
    fn test_take_hit_scenario() {
        let mut e = enemy();
        let dealt = e.take_hit(30.0, 200.0, Some(Facing::Left));

        assert_eq!(dealt, 30.0);
        assert_eq!(e.health(), 20.0);
        assert_eq!(e.vitals().h_bar_damage(), 30.0);
        assert_eq!(e.body().knockback_vx, -200.0);
        assert_eq!(e.state(), EnemyPose::Staggered);

        // Invulnerable right after
        assert_eq!(e.take_hit(30.0, 200.0, Some(Facing::Left)), 0.0);
        assert_eq!(e.health(), 20.0);
    }

    #[test]
    fn test_knockback_needs_side() {
        let mut e = enemy();
        e.take_hit(5.0, 200.0, None);
        assert_eq!(e.body().knockback_vx, 0.0);
    }

    #[test]
    fn test_knockback_adds_to_existing() {
        let mut e = enemy();
        e.body.knockback_vx = 150.0;
        e.take_hit(10.0, 200.0, Some(Facing::Left));
        assert_eq!(e.body().knockback_vx, -50.0);
    }

    #[test]
    fn test_lethal_hit_kills() {
        let mut e = enemy();
        assert_eq!(e.take_hit(80.0, 0.0, None), 50.0);
        assert_eq!(e.alert(), AlertState::Dead);
        assert!(e.is_dead());
    }

    #[test]
    fn test_alert_sequence() {
        let mut e = enemy();
        let bus = EventBus::new(64);
        let target = Rect::new(250.0, 100.0, 20.0, 40.0);

        run(&mut e, &target, &bus, 0.05);
        assert_eq!(e.alert(), AlertState::Alerting);
        run(&mut e, &target, &bus, 0.2);
        assert_eq!(e.alert(), AlertState::Alerted);
        assert!(bus.drain().contains(&GameEvent::Alerted { enemy: e.id() }));

        // Out of sight: alert is retained, then dropped
        let hidden = Rect::new(-500.0, 100.0, 20.0, 40.0);
        run(&mut e, &hidden, &bus, 0.5);
        assert_eq!(e.alert(), AlertState::Alerted);
        run(&mut e, &hidden, &bus, 0.6);
        assert_eq!(e.alert(), AlertState::Idle);
    }

    #[test]
    fn test_losing_sight_while_alerting_resets() {
        let mut e = enemy();
        let bus = EventBus::new(64);
        run(&mut e, &Rect::new(250.0, 100.0, 20.0, 40.0), &bus, 0.05);
        assert_eq!(e.alert(), AlertState::Alerting);
        run(&mut e, &Rect::new(-500.0, 100.0, 20.0, 40.0), &bus, 0.01);
        assert_eq!(e.alert(), AlertState::Idle);
    }

    #[test]
    fn test_strikes_once_per_swing() {
        let mut e = enemy();
        let bus = EventBus::new(256);
        let target = Rect::new(125.0, 100.0, 20.0, 40.0);

        let strikes = run(&mut e, &target, &bus, 0.6);
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].damage, 10.0);
        assert_eq!(strikes[0].side, Facing::Right);

        let events = bus.drain();
        let actor = Actor::Enemy(e.id());
        assert!(events.contains(&GameEvent::AttackStarted { actor }));
        assert!(events.contains(&GameEvent::AttackStopped { actor }));
    }

    #[test]
    fn test_stagger_cancels_swing() {
        let mut e = enemy();
        let bus = EventBus::new(256);
        let target = Rect::new(125.0, 100.0, 20.0, 40.0);
        run(&mut e, &target, &bus, 0.25);
        assert_eq!(e.attack().phase(), AttackPhase::Windup);

        e.take_hit(1.0, 0.0, None);
        let strikes = run(&mut e, &target, &bus, 0.05);
        assert!(strikes.is_empty());
        assert_eq!(e.attack().phase(), AttackPhase::Cooldown);
    }

    #[test]
    fn test_difficulty_scales_stats() {
        let progression = Progression {
            difficulty: 2,
            ..Progression::default()
        };
        let e = Enemy::from_template(
            EntityId::from_raw(1),
            EnemyKind::Grunt,
            &template(),
            Rect::new(0.0, 0.0, 20.0, 40.0),
            Facing::Right,
            PatrolArea::fixed(0.0),
            &progression,
        );
        assert!((e.health() - 65.0).abs() < 1e-9);
        assert!((e.damage() - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_integrate_stays_in_patrol_area() {
        use ashfall_kernel::{GridQuery, SpatialGrid};

        let mut grid = SpatialGrid::new(600.0, 400.0, 32);
        grid.insert(&Rect::new(0.0, 140.0, 600.0, 40.0), EntityRef::Wall(0));
        let mut e = enemy();
        e.take_hit(1.0, 5000.0, Some(Facing::Right));

        let mut query = GridQuery::new(&grid, EntityRef::is_solid);
        for _ in 0..100 {
            e.integrate(&mut query, 0.01);
        }
        assert!(e.rect().left <= 300.0);
        assert!(e.body().on_ground);
        assert!((e.rect().bottom() - 140.0).abs() < 1e-9);
    }
}
