//! # Port Resolution
//!
//! Names, values and connection state for every port on a node.

mod ports;

pub use ports::*;
