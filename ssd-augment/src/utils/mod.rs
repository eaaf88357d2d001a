//! Miscellaneous utilities.

mod ratio;
pub use ratio::*;
