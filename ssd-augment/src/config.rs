//! Preprocessor configuration format.

use crate::{
    common::*,
    image::DataFormat,
    preprocess::{Preprocessor, PreprocessorInit},
    processor::{ColorDistortInit, DistortedCropInit, ResampleInit},
    utils::Ratio,
};

/// The augmentation configuration.
///
/// Only `out_shape` is mandatory. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    /// The output `[height, width]`.
    pub out_shape: [usize; 2],
    #[serde(default)]
    pub data_format: DataFormat,
    /// Restrict the color distortion to brightness and saturation.
    #[serde(default = "defaults::bool_false")]
    pub fast_mode: bool,
    /// The crop window must cover at least this fraction of some box.
    #[serde(default = "defaults::min_object_covered")]
    pub min_object_covered: R64,
    #[serde(default = "defaults::aspect_ratio_range")]
    pub aspect_ratio_range: (R64, R64),
    /// Bounds of the crop window area relative to the image area.
    #[serde(default = "defaults::area_range")]
    pub area_range: (R64, R64),
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: usize,
    /// Boxes overlapping the crop window by no more than this fraction are dropped.
    #[serde(default = "defaults::bbox_crop_overlap")]
    pub bbox_crop_overlap: R64,
    #[serde(default = "defaults::horizontal_flip_prob")]
    pub horizontal_flip_prob: Ratio,
    #[serde(default = "defaults::brightness_max_delta")]
    pub brightness_max_delta: R64,
    #[serde(default = "defaults::factor_range")]
    pub saturation_range: (R64, R64),
    #[serde(default = "defaults::hue_max_delta")]
    pub hue_max_delta: R64,
    #[serde(default = "defaults::factor_range")]
    pub contrast_range: (R64, R64),
    /// Color distorted values are clamped to this range, in `[0, 1]` units.
    #[serde(default = "defaults::color_clip_range")]
    pub color_clip_range: (R64, R64),
}

impl PreprocessorConfig {
    /// Default configuration for the given output shape.
    pub fn new(out_shape: [usize; 2]) -> Self {
        Self {
            out_shape,
            data_format: DataFormat::default(),
            fast_mode: defaults::bool_false(),
            min_object_covered: defaults::min_object_covered(),
            aspect_ratio_range: defaults::aspect_ratio_range(),
            area_range: defaults::area_range(),
            max_attempts: defaults::max_attempts(),
            bbox_crop_overlap: defaults::bbox_crop_overlap(),
            horizontal_flip_prob: defaults::horizontal_flip_prob(),
            brightness_max_delta: defaults::brightness_max_delta(),
            saturation_range: defaults::factor_range(),
            hue_max_delta: defaults::hue_max_delta(),
            contrast_range: defaults::factor_range(),
            color_clip_range: defaults::color_clip_range(),
        }
    }

    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }

    pub fn build(&self) -> Result<Preprocessor> {
        PreprocessorInit::from(self).build()
    }
}

impl FromStr for PreprocessorConfig {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(json5::from_str(text)?)
    }
}

impl From<&PreprocessorConfig> for PreprocessorInit {
    fn from(config: &PreprocessorConfig) -> Self {
        let PreprocessorConfig {
            out_shape,
            data_format,
            fast_mode,
            min_object_covered,
            aspect_ratio_range,
            area_range,
            max_attempts,
            bbox_crop_overlap,
            horizontal_flip_prob,
            brightness_max_delta,
            saturation_range,
            hue_max_delta,
            contrast_range,
            color_clip_range,
        } = *config;

        Self {
            crop: DistortedCropInit {
                min_object_covered,
                aspect_ratio_range,
                area_range,
                max_attempts,
                min_overlap: bbox_crop_overlap,
            },
            resample: ResampleInit {
                out_shape,
                horizontal_flip_prob,
            },
            color: ColorDistortInit {
                fast_mode,
                max_brightness_delta: brightness_max_delta,
                saturation_range,
                max_hue_delta: hue_max_delta,
                contrast_range,
                clip_range: color_clip_range,
            },
            data_format,
        }
    }
}

mod defaults {
    use super::*;

    pub fn bool_false() -> bool {
        false
    }

    pub fn min_object_covered() -> R64 {
        R64::new(0.9)
    }

    pub fn aspect_ratio_range() -> (R64, R64) {
        (R64::new(0.8), R64::new(1.2))
    }

    pub fn area_range() -> (R64, R64) {
        (R64::new(0.1), R64::new(1.0))
    }

    pub fn max_attempts() -> usize {
        500
    }

    pub fn bbox_crop_overlap() -> R64 {
        R64::new(0.1)
    }

    pub fn horizontal_flip_prob() -> Ratio {
        Ratio::half()
    }

    pub fn brightness_max_delta() -> R64 {
        R64::new(32.0 / 255.0)
    }

    pub fn factor_range() -> (R64, R64) {
        (R64::new(0.5), R64::new(1.5))
    }

    pub fn hue_max_delta() -> R64 {
        R64::new(0.2)
    }

    pub fn color_clip_range() -> (R64, R64) {
        (R64::new(0.0), R64::new(1.0))
    }
}
