//! Transmutation Simulator Library
//!
//! This library builds the decay/neutron-capture network of a seed isotope
//! from nuclear data and integrates isotope populations under irradiation.

pub mod error;
pub mod half_life;
pub mod nuclear_data;
pub mod reactor;
pub mod commands;

pub use error::{Result, SimulatorError};
pub use nuclear_data::{Isotope, IsotopeKey, NuclearDataSource, NuclearDatabase, SearchType};
pub use reactor::{
    GraphBuilder, IsotopeGraph, IsotopeState, ReactorSimulator, SimulationParameters,
    TimeEvolution,
};
pub use commands::{SimulationRequest, SimulationResponse};
