//! Command implementations for the taskcycle CLI

pub mod defaults;
pub mod run;
pub mod validate;
