//! This module exports the types that describe a decoded picture: its
//! [Dimensions] and a borrowed view of its [YuvPlanes].

mod dimensions;
mod planes;

pub use dimensions::*;
pub use planes::*;
