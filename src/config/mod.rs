mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, swap_config};
pub use structs::*;
