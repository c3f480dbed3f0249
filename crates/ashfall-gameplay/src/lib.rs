//! # Ashfall Gameplay
//!
//! The simulation core of Ashfall.
//!
//! This crate provides:
//! - Player controller with rolls, slams, wall climbing and ledge pull-ups
//! - Enemies assembled from movement, sensing and attack-shape strategies
//! - The level: walls, one-way platforms, pickups and damage numbers
//! - Attack timing shared by the player weapon and enemies
//! - Event bus for presentation hooks
//! - The `Simulation` that ties one fixed-step tick together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod attack;
pub mod camera;
pub mod effects;
pub mod enemy;
pub mod entity;
pub mod events;
pub mod input;
pub mod map;
pub mod map_data;
pub mod physics;
pub mod pickup;
pub mod player;
pub mod progression;
pub mod simulation;
pub mod velocity;
pub mod vitals;
pub mod weapon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attack::*;
    pub use crate::camera::*;
    pub use crate::effects::*;
    pub use crate::enemy::*;
    pub use crate::entity::*;
    pub use crate::events::*;
    pub use crate::input::*;
    pub use crate::map::*;
    pub use crate::map_data::*;
    pub use crate::physics::*;
    pub use crate::pickup::*;
    pub use crate::player::*;
    pub use crate::progression::*;
    pub use crate::simulation::*;
    pub use crate::velocity::*;
    pub use crate::vitals::*;
    pub use crate::weapon::*;
}

pub use prelude::*;
