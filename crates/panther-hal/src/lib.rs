//! `panther-hal` – Power-stage hardware abstraction
//!
//! # Modules
//!
//! - [`power_stage`] – [`PowerStage`]: the two digital lines the power
//!   controller consumes (power-stage-ready input, motor-enable output).
//! - [`sim`] – [`SimPowerStage`][sim::SimPowerStage]: an in-process stand-in
//!   for the GPIO driver used by tests and the operator binary.

pub mod power_stage;
pub mod sim;

pub use power_stage::PowerStage;
pub use sim::{SimPowerStage, SimPowerStageHandle};
