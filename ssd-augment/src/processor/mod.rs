//! Data preprocessing building blocks.

pub mod color_distort;
pub mod distorted_crop;
pub mod mask;
pub mod random_selector;
pub mod resample;

pub use color_distort::*;
pub use distorted_crop::*;
pub use mask::*;
pub use random_selector::*;
pub use resample::*;
