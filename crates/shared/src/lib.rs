//! Value types shared between backend adapters and the panel.

pub mod domain;
pub mod print_time;
pub mod protocol;
pub mod status;
