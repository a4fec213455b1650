// Core data models for Foco
// These structs represent the domain entities

pub mod task;
pub mod action;

pub use task::*;
pub use action::*;
