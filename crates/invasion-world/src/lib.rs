//! World model for the alien invasion simulation.
//!
//! A [`World`] is a named graph of cities joined by north/south/east/west
//! roads, parsed from a plain-text map. [`Alien`]s land in empty cities and
//! wander the roads; a [`Simulation`] runs the whole invasion and reports
//! what survives.

pub mod alien;
pub mod city;
pub mod simulation;
pub mod world;

pub use alien::Alien;
pub use city::City;
pub use simulation::{Simulation, SimulationReport};
pub use world::World;
