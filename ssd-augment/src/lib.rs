//! Training-time image augmentation for SSD-style object detectors.
//!
//! An image with its labeled boxes is randomly cropped around the boxes,
//! resized, flipped and color distorted, and the surviving boxes are
//! rasterized into a binary occupancy mask.

mod common;
pub mod config;
pub mod image;
pub mod preprocess;
pub mod processor;
pub mod utils;

pub use common::RatioLabel;
pub use config::PreprocessorConfig;
pub use image::{DataFormat, ImageExt, IntoUnitImage};
pub use preprocess::*;
