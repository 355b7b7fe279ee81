//! Process lifecycle: startup wiring, shutdown, and mode dispatch.

pub mod lifetime;
pub mod modes;
