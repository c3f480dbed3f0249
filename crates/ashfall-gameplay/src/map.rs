//! The level: static geometry, the spatial grid and every dynamic non-player
//! entity.
//!
//! The map owns enemies, pickups and damage numbers and keeps the grid in step
//! with them: anything that moves is relocated with its pre-move extent, and
//! anything that leaves is deregistered before it is dropped. The player lives
//! outside the grid and is handed in each tick.

use ahash::AHashSet;
use fastrand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use ashfall_common::EntityId;
use ashfall_kernel::{CollisionQuery, Direction, Rect, SpatialGrid};

use crate::effects::DamageNumber;
use crate::enemy::{find_patrol_area, AlertState, Enemy, EnemyContext, EnemyKind, WallSight};
use crate::entity::{Actor, Body, Damageable, EntityRef, Facing};
use crate::events::{EventBus, GameEvent};
use crate::map_data::{EnemySpawn, MapData, PickupSpawn};
use crate::pickup::{Pickup, DEFAULT_HEAL};
use crate::progression::Progression;
use crate::simulation::TickContext;

/// Tolerance for "was above the platform" checks.
pub const PLATFORM_EPSILON: f64 = 1e-6;

/// Sideways spread of damage numbers.
const DAMAGE_NUMBER_SPREAD: f64 = 40.0;

/// A one-way platform.
///
/// Movers coming from above land on it. A mover that touches it any other way
/// is put in `passing` and ignored until it no longer overlaps.
#[derive(Debug, Clone)]
pub struct Platform {
    rect: Rect,
    passing: AHashSet<EntityRef>,
}

impl Platform {
    /// Creates a platform.
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            passing: AHashSet::new(),
        }
    }

    /// Platform extent.
    #[must_use]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    /// True if `mover` is currently passing through.
    #[must_use]
    pub fn is_passing(&self, mover: EntityRef) -> bool {
        self.passing.contains(&mover)
    }

    fn supports(&self, rect: &Rect) -> bool {
        (rect.bottom() - self.rect.top).abs() <= PLATFORM_EPSILON && rect.overlaps_horizontally(&self.rect)
    }
}

/// Collision query over walls and one-way platforms.
pub struct MapObstacles<'a> {
    grid: &'a SpatialGrid<EntityRef>,
    platforms: &'a mut [Platform],
}

impl<'a> MapObstacles<'a> {
    /// Creates a query borrowing the map's grid and platforms.
    pub fn new(grid: &'a SpatialGrid<EntityRef>, platforms: &'a mut [Platform]) -> Self {
        Self { grid, platforms }
    }
}

impl CollisionQuery<EntityRef> for MapObstacles<'_> {
    fn overlapping(&self, mover: EntityRef, region: &Rect) -> Vec<(EntityRef, Rect)> {
        self.grid
            .query_with_bounds(region, true, |id| *id != mover && id.is_solid())
    }

    fn blocks(&mut self, mover: EntityRef, before: &Rect, other: EntityRef, other_rect: &Rect, direction: Direction) -> bool {
        match other {
            EntityRef::Wall(_) => true,
            EntityRef::Platform(index) => {
                let Some(platform) = self.platforms.get_mut(index) else {
                    return false;
                };
                if platform.passing.contains(&mover) {
                    return false;
                }
                if direction == Direction::Down && before.bottom() <= other_rect.top + PLATFORM_EPSILON {
                    return true;
                }
                trace!("{:?} passing through platform {}", mover, index);
                platform.passing.insert(mover);
                false
            },
            _ => false,
        }
    }
}

/// The loaded level.
#[derive(Debug)]
pub struct Map {
    width: f64,
    height: f64,
    grid: SpatialGrid<EntityRef>,
    walls: Vec<Rect>,
    platforms: Vec<Platform>,
    enemies: BTreeMap<EntityId, Enemy>,
    pickups: BTreeMap<EntityId, Pickup>,
    damage_numbers: Vec<DamageNumber>,
    rng: Rng,
    player_spawn: Rect,
    init_facing: Facing,
    seed: u64,
}

impl Map {
    /// Builds the level from parsed data. Enemy stats are scaled by `progression`.
    #[must_use]
    pub fn from_data(data: &MapData, progression: &Progression) -> Self {
        let mut grid = SpatialGrid::new(data.width, data.height, data.cell_size);
        for (i, wall) in data.walls.iter().enumerate() {
            grid.insert(wall, EntityRef::Wall(i));
        }
        for (i, platform) in data.platforms.iter().enumerate() {
            grid.insert(platform, EntityRef::Platform(i));
        }

        let mut map = Self {
            width: data.width,
            height: data.height,
            grid,
            walls: data.walls.clone(),
            platforms: data.platforms.iter().copied().map(Platform::new).collect(),
            enemies: BTreeMap::new(),
            pickups: BTreeMap::new(),
            damage_numbers: Vec::new(),
            rng: Rng::with_seed(data.seed),
            player_spawn: data.player_spawn,
            init_facing: data.init_facing,
            seed: data.seed,
        };
        for spawn in &data.enemies {
            map.spawn_enemy(spawn.kind, spawn.x, spawn.y, spawn.facing, progression);
        }
        for spawn in &data.pickups {
            map.spawn_pickup(Pickup::new(EntityId::new(), spawn.x, spawn.y, spawn.heal));
        }

        info!(
            "Loaded {}x{} map: {} walls, {} platforms, {} enemies, {} pickups",
            data.width,
            data.height,
            map.walls.len(),
            map.platforms.len(),
            map.enemies.len(),
            map.pickups.len()
        );
        map
    }

    /// Snapshot of the current level in loader format.
    #[must_use]
    pub fn save(&self) -> MapData {
        MapData {
            width: self.width,
            height: self.height,
            cell_size: self.grid.cell_size(),
            player_spawn: self.player_spawn,
            init_facing: self.init_facing,
            walls: self.walls.clone(),
            platforms: self.platforms.iter().map(|p| p.rect).collect(),
            enemies: self
                .enemies
                .values()
                .map(|e| EnemySpawn {
                    kind: e.kind(),
                    x: e.rect().left,
                    y: e.rect().top,
                    facing: e.body().facing,
                })
                .collect(),
            pickups: self
                .pickups
                .values()
                .map(|p| PickupSpawn {
                    x: p.rect().left,
                    y: p.rect().top,
                    heal: p.heal(),
                })
                .collect(),
            seed: self.seed,
        }
    }

    /// World width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// World height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// World bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Where the player starts.
    #[must_use]
    pub fn player_spawn(&self) -> Rect {
        self.player_spawn
    }

    /// Player facing at spawn.
    #[must_use]
    pub fn init_facing(&self) -> Facing {
        self.init_facing
    }

    /// The spatial index.
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid<EntityRef> {
        &self.grid
    }

    /// Solid walls.
    #[must_use]
    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// One-way platforms.
    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Live enemies in id order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Looks up an enemy.
    #[must_use]
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Pickups in id order.
    pub fn pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.values()
    }

    /// Active damage numbers.
    #[must_use]
    pub fn damage_numbers(&self) -> &[DamageNumber] {
        &self.damage_numbers
    }

    /// Collision query for a mover.
    pub fn obstacles(&mut self) -> MapObstacles<'_> {
        MapObstacles::new(&self.grid, &mut self.platforms)
    }

    /// Walls strictly overlapping `rect`.
    #[must_use]
    pub fn walls_overlapping(&self, rect: &Rect) -> Vec<(EntityRef, Rect)> {
        self.grid.query_with_bounds(rect, true, EntityRef::is_wall)
    }

    /// True if any wall overlaps `rect`.
    #[must_use]
    pub fn is_blocked(&self, rect: &Rect) -> bool {
        !self.walls_overlapping(rect).is_empty()
    }

    /// Live enemies strictly overlapping `rect`.
    #[must_use]
    pub fn enemies_overlapping(&self, rect: &Rect) -> Vec<EntityId> {
        self.grid
            .query_region(rect, true, |id| id.enemy().is_some())
            .into_iter()
            .filter_map(|id| id.enemy())
            .filter(|id| self.enemies.get(id).is_some_and(|e| e.alert() != AlertState::Dead))
            .collect()
    }

    /// Drops `mover` from the passing set of platforms it no longer overlaps.
    pub fn release_platforms(&mut self, mover: EntityRef, rect: &Rect) {
        release(&mut self.platforms, mover, rect);
    }

    /// True if `rect` stands on top of a one-way platform.
    #[must_use]
    pub fn on_platform(&self, mover: EntityRef, rect: &Rect) -> bool {
        self.platforms
            .iter()
            .any(|p| !p.is_passing(mover) && p.supports(rect))
    }

    /// Lets `mover` fall through the platform it stands on. Returns false if
    /// it is not standing on one.
    pub fn drop_through(&mut self, mover: EntityRef, rect: &Rect) -> bool {
        let mut dropped = false;
        for (i, platform) in self.platforms.iter_mut().enumerate() {
            if platform.supports(rect) {
                debug!("{:?} dropping through platform {}", mover, i);
                platform.passing.insert(mover);
                dropped = true;
            }
        }
        dropped
    }

    /// Places an enemy of `kind` with its top-left at `(x, y)`, snapping it
    /// onto the ground and computing its patrol area.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, x: f64, y: f64, facing: Facing, progression: &Progression) -> EntityId {
        let template = kind.template();
        let mut rect = Rect::new(x, y, template.width, template.height);
        let patrol = find_patrol_area(&self.grid, &mut rect, self.height, &mut self.rng);

        let id = EntityId::new();
        let enemy = Enemy::from_template(id, kind, &template, rect, facing, patrol, progression);
        self.grid.insert(&rect, enemy.entity_ref());
        self.enemies.insert(id, enemy);
        id
    }

    /// Removes an enemy, deregistering it from the grid first.
    pub fn despawn_enemy(&mut self, id: EntityId) -> Option<Enemy> {
        let rect = self.enemies.get(&id)?.rect();
        self.grid.remove(&rect, EntityRef::Enemy(id));
        self.enemies.remove(&id)
    }

    /// Adds a pickup.
    pub fn spawn_pickup(&mut self, pickup: Pickup) -> EntityId {
        let id = pickup.id();
        self.grid.insert(&pickup.rect(), pickup.entity_ref());
        self.pickups.insert(id, pickup);
        id
    }

    /// Removes and returns every pickup overlapping `rect`.
    pub fn collect_pickups(&mut self, rect: &Rect) -> Vec<Pickup> {
        let found = self
            .grid
            .query_region(rect, true, |id| matches!(id, EntityRef::Pickup(_)));
        let mut collected = Vec::new();
        for entity in found {
            let EntityRef::Pickup(id) = entity else {
                continue;
            };
            if let Some(pickup) = self.pickups.get(&id) {
                self.grid.remove(&pickup.rect(), entity);
            }
            collected.extend(self.pickups.remove(&id));
        }
        collected
    }

    /// Spawns a floating damage number.
    pub fn spawn_damage_number(&mut self, x: f64, y: f64, value: f64) {
        let spread = (self.rng.f64() - 0.5) * DAMAGE_NUMBER_SPREAD;
        self.damage_numbers
            .push(DamageNumber::new(EntityId::new(), x, y, value, spread));
    }

    /// Applies a player hit to an enemy. Returns the damage dealt.
    pub fn hit_enemy(&mut self, id: EntityId, damage: f64, knockback: f64, side: Facing, events: &EventBus) -> f64 {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return 0.0;
        };
        let dealt = enemy.take_hit(damage, knockback, Some(side));
        if dealt <= 0.0 {
            return 0.0;
        }
        let center = enemy.rect().center();
        trace!("Enemy {} took {:.1}", id, dealt);
        events.publish(GameEvent::Hit {
            target: Actor::Enemy(id),
            damage: dealt,
            x: center.x,
            y: center.y,
        });
        self.spawn_damage_number(center.x, center.y, dealt);
        dealt
    }

    /// Advances every enemy, pickup and damage number.
    ///
    /// Enemies think and strike first, then move, then dead ones are removed.
    pub fn tick<P>(&mut self, player: &mut P, ctx: &mut TickContext<'_>, dt: f64)
    where
        P: Body + Damageable,
    {
        let target = player.rect();

        let mut strikes = Vec::new();
        {
            let sight = WallSight::new(&self.grid);
            let enemy_ctx = EnemyContext {
                target: &target,
                sight: &sight,
                events: ctx.events,
            };
            for enemy in self.enemies.values_mut() {
                if let Some(strike) = enemy.think(&enemy_ctx, dt) {
                    strikes.push(strike);
                }
            }
        }

        for strike in strikes {
            if player.is_dead() {
                break;
            }
            let dealt = player.take_hit(strike.damage, strike.knockback, Some(strike.side));
            if dealt <= 0.0 {
                continue;
            }
            let center = target.center();
            ctx.events.publish(GameEvent::Hit {
                target: Actor::Player,
                damage: dealt,
                x: center.x,
                y: center.y,
            });
            self.spawn_damage_number(center.x, center.y, dealt);
            if player.is_dead() {
                info!("Player died");
                ctx.events.publish(GameEvent::Died { actor: Actor::Player });
            }
        }

        for enemy in self.enemies.values_mut() {
            enemy.steer(&target, &mut self.rng, dt);
            let old = enemy.rect();
            enemy.integrate(&mut MapObstacles::new(&self.grid, &mut self.platforms), dt);
            let new = enemy.rect();
            if new != old {
                self.grid.relocate(&old, &new, enemy.entity_ref());
                release(&mut self.platforms, enemy.entity_ref(), &new);
            }
        }

        let dead: Vec<EntityId> = self
            .enemies
            .values()
            .filter(|e| e.alert() == AlertState::Dead)
            .map(Enemy::id)
            .collect();
        for id in dead {
            self.kill_enemy(id, ctx);
        }

        for pickup in self.pickups.values_mut() {
            let old = pickup.rect();
            if pickup.integrate(&mut MapObstacles::new(&self.grid, &mut self.platforms), dt) {
                let new = pickup.rect();
                self.grid.relocate(&old, &new, pickup.entity_ref());
                release(&mut self.platforms, pickup.entity_ref(), &new);
            }
        }

        self.damage_numbers.retain_mut(|n| n.tick(dt));
    }

    fn kill_enemy(&mut self, id: EntityId, ctx: &mut TickContext<'_>) {
        let Some(enemy) = self.despawn_enemy(id) else {
            return;
        };
        ctx.progression.award(enemy.score());
        debug!("Enemy {} died, score now {}", id, ctx.progression.score);
        ctx.events.publish(GameEvent::Died { actor: Actor::Enemy(id) });

        if self.rng.f64() < enemy.drop_chance() {
            let center = enemy.rect().center();
            self.spawn_pickup(Pickup::dropped(EntityId::new(), center.x, center.y, DEFAULT_HEAL));
        }
    }
}

fn release(platforms: &mut [Platform], mover: EntityRef, rect: &Rect) {
    for platform in platforms {
        if !platform.rect.overlaps(rect) {
            platform.passing.remove(&mover);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_kernel::move_box;

    fn floor_map() -> MapData {
        MapData::new(800.0, 600.0, Rect::new(40.0, 400.0, 24.0, 48.0))
            .with_wall(Rect::new(0.0, 500.0, 800.0, 40.0))
            .with_platform(Rect::new(200.0, 400.0, 100.0, 10.0))
    }

    struct Dummy {
        rect: Rect,
        health: f64,
    }

    impl Body for Dummy {
        type State = ();

        fn rect(&self) -> Rect {
            self.rect
        }

        fn state(&self) {}
    }

    impl Damageable for Dummy {
        fn take_hit(&mut self, damage: f64, _knockback: f64, _side: Option<Facing>) -> f64 {
            let dealt = damage.min(self.health);
            self.health -= dealt;
            dealt
        }

        fn health(&self) -> f64 {
            self.health
        }
    }

    #[test]
    fn test_load_registers_geometry() {
        let map = Map::from_data(&floor_map(), &Progression::default());
        assert!(map.grid().contains(EntityRef::Wall(0)));
        assert!(map.grid().contains(EntityRef::Platform(0)));
        assert_eq!(map.save().walls, floor_map().walls);
    }

    #[test]
    fn test_platform_lands_from_above() {
        let mut map = Map::from_data(&floor_map(), &Progression::default());
        let mut rect = Rect::new(220.0, 340.0, 20.0, 50.0);
        let hits = move_box(&mut rect, EntityRef::Player, 0.0, 30.0, &mut map.obstacles());
        assert_eq!(hits.len(), 1);
        assert_eq!(rect.bottom(), 400.0);
        assert!(map.on_platform(EntityRef::Player, &rect));
    }

    #[test]
    fn test_platform_passes_from_below() {
        let mut map = Map::from_data(&floor_map(), &Progression::default());
        let mut rect = Rect::new(220.0, 420.0, 20.0, 50.0);
        let hits = move_box(&mut rect, EntityRef::Player, 0.0, -30.0, &mut map.obstacles());
        assert!(hits.is_empty());
        assert!(map.platforms()[0].is_passing(EntityRef::Player));

        // Still overlapping on the way back down: not blocked
        let hits = move_box(&mut rect, EntityRef::Player, 0.0, 5.0, &mut map.obstacles());
        assert!(hits.is_empty());

        // Once clear, the pass is released
        let mut above = Rect::new(220.0, 300.0, 20.0, 50.0);
        map.release_platforms(EntityRef::Player, &above);
        assert!(!map.platforms()[0].is_passing(EntityRef::Player));
        let hits = move_box(&mut above, EntityRef::Player, 0.0, 60.0, &mut map.obstacles());
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_drop_through() {
        let mut map = Map::from_data(&floor_map(), &Progression::default());
        let mut rect = Rect::new(220.0, 350.0, 20.0, 50.0);
        assert!(map.drop_through(EntityRef::Player, &rect));
        assert!(!map.on_platform(EntityRef::Player, &rect));
        let hits = move_box(&mut rect, EntityRef::Player, 0.0, 10.0, &mut map.obstacles());
        assert!(hits.is_empty());
        assert!(!map.drop_through(EntityRef::Player, &Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_enemy_spawn_snaps_to_floor() {
        let data = floor_map().with_enemy(EnemyKind::Grunt, 600.0, 100.0);
        let map = Map::from_data(&data, &Progression::default());
        let enemy = map.enemies().next().expect("enemy spawned");
        assert_eq!(enemy.rect().bottom(), 500.0);
        assert_eq!(map.grid().extent(enemy.entity_ref()), Some(&enemy.rect()));
    }

    #[test]
    fn test_kill_awards_and_deregisters() {
        let data = floor_map().with_enemy(EnemyKind::Grunt, 600.0, 100.0).with_seed(3);
        let mut map = Map::from_data(&data, &Progression::default());
        let id = map.enemies().next().map(Enemy::id).expect("enemy spawned");
        let bus = EventBus::new(64);
        let mut progression = Progression::default();

        let dealt = map.hit_enemy(id, 1000.0, 0.0, Facing::Right, &bus);
        assert!(dealt > 0.0);
        assert_eq!(map.damage_numbers().len(), 1);

        let mut player = Dummy {
            rect: Rect::new(40.0, 452.0, 24.0, 48.0),
            health: 100.0,
        };
        let mut ctx = TickContext {
            events: &bus,
            progression: &mut progression,
        };
        map.tick(&mut player, &mut ctx, 1.0 / 60.0);

        assert_eq!(map.enemy_count(), 0);
        assert!(!map.grid().contains(EntityRef::Enemy(id)));
        assert_eq!(progression.score, EnemyKind::Grunt.template().score);
        let events = bus.drain();
        assert!(events.contains(&GameEvent::Died { actor: Actor::Enemy(id) }));
    }

    #[test]
    fn test_enemy_strikes_player() {
        let data = floor_map().with_enemy(EnemyKind::Grunt, 300.0, 456.0);
        let mut map = Map::from_data(&data, &Progression::default());
        let enemy_rect = map.enemies().next().map(Enemy::rect).expect("enemy spawned");
        let bus = EventBus::new(256);
        let mut progression = Progression::default();
        let mut player = Dummy {
            rect: Rect::new(enemy_rect.left - 30.0, 452.0, 24.0, 48.0),
            health: 100.0,
        };

        for _ in 0..180 {
            let mut ctx = TickContext {
                events: &bus,
                progression: &mut progression,
            };
            map.tick(&mut player, &mut ctx, 1.0 / 60.0);
        }
        assert!(player.health < 100.0);
        assert!(bus
            .drain()
            .iter()
            .any(|e| matches!(e, GameEvent::Hit { target: Actor::Player, .. })));
    }

    #[test]
    fn test_collect_pickups() {
        let data = floor_map().with_pickup(100.0, 300.0, 30.0);
        let mut map = Map::from_data(&data, &Progression::default());
        let bus = EventBus::new(64);
        let mut progression = Progression::default();
        let mut player = Dummy {
            rect: Rect::new(600.0, 452.0, 24.0, 48.0),
            health: 100.0,
        };
        for _ in 0..120 {
            let mut ctx = TickContext {
                events: &bus,
                progression: &mut progression,
            };
            map.tick(&mut player, &mut ctx, 1.0 / 60.0);
        }
        let orb = map.pickups().next().map(Body::rect).expect("pickup present");
        assert_eq!(orb.bottom(), 500.0);

        let collected = map.collect_pickups(&Rect::new(90.0, 450.0, 40.0, 50.0));
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].heal(), 30.0);
        assert_eq!(map.pickups().count(), 0);
        assert!(map.grid().query_region(&orb, false, |_| true).iter().all(|id| id.is_solid()));
    }
}
