//! Document transforms: steps, the position maps they produce, and mapping
//! positions through a sequence of steps.

pub mod map;
pub mod step;

pub use map::*;
pub use step::*;
