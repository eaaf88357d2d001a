//! The random color distortion algorithm.

use crate::{common::*, image::ImageExt};

/// The number of distinct color op orderings.
pub const NUM_COLOR_ORDERINGS: usize = 4;

/// A single photometric perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorOp {
    Brightness,
    Saturation,
    Hue,
    Contrast,
}

/// Color ops are not commutative, so each ordering maps to a fixed sequence.
pub fn color_ops(ordering: usize, fast_mode: bool) -> Result<&'static [ColorOp]> {
    use ColorOp::*;

    ensure!(
        ordering < NUM_COLOR_ORDERINGS,
        "color_ordering must be in [0, 3], but get {}",
        ordering
    );

    let ops: &[ColorOp] = match (fast_mode, ordering) {
        (true, 0) => &[Brightness, Saturation],
        (true, _) => &[Saturation, Brightness],
        (false, 0) => &[Brightness, Saturation, Hue, Contrast],
        (false, 1) => &[Saturation, Brightness, Contrast, Hue],
        (false, 2) => &[Contrast, Hue, Brightness, Saturation],
        (false, _) => &[Hue, Saturation, Contrast, Brightness],
    };
    Ok(ops)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorDistortInit {
    /// Skip the hue and contrast ops.
    pub fast_mode: bool,
    pub max_brightness_delta: R64,
    pub saturation_range: (R64, R64),
    pub max_hue_delta: R64,
    pub contrast_range: (R64, R64),
    /// The range output values are clamped into.
    pub clip_range: (R64, R64),
}

impl ColorDistortInit {
    pub fn build(self) -> Result<ColorDistort> {
        let Self {
            fast_mode,
            max_brightness_delta,
            saturation_range,
            max_hue_delta,
            contrast_range,
            clip_range,
        } = self;

        ensure!(
            max_brightness_delta >= 0.0,
            "max_brightness_delta must be non-negative"
        );
        ensure!(
            (0.0..=0.5).contains(&max_hue_delta.raw()),
            "max_hue_delta must be in range [0.0, 0.5]"
        );
        let check_factor_range = |name: &str, (lo, up): (R64, R64)| -> Result<_> {
            ensure!(lo >= 0.0, "{} lower bound must be non-negative", name);
            ensure!(lo <= up, "{} lower bound must not exceed upper bound", name);
            Ok((lo.raw() as f32, up.raw() as f32))
        };
        let saturation_range = check_factor_range("saturation_range", saturation_range)?;
        let contrast_range = check_factor_range("contrast_range", contrast_range)?;
        ensure!(
            clip_range.0 < clip_range.1,
            "clip_range lower bound must be less than upper bound"
        );

        Ok(ColorDistort {
            fast_mode,
            max_brightness_delta: max_brightness_delta.raw() as f32,
            saturation_range,
            max_hue_delta: max_hue_delta.raw() as f32,
            contrast_range,
            clip_range: (clip_range.0.raw() as f32, clip_range.1.raw() as f32),
        })
    }
}

impl Default for ColorDistortInit {
    fn default() -> Self {
        Self {
            fast_mode: false,
            max_brightness_delta: r64(32.0 / 255.0),
            saturation_range: (r64(0.5), r64(1.5)),
            max_hue_delta: r64(0.2),
            contrast_range: (r64(0.5), r64(1.5)),
            clip_range: (r64(0.0), r64(1.0)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorDistort {
    fast_mode: bool,
    max_brightness_delta: f32,
    saturation_range: (f32, f32),
    max_hue_delta: f32,
    contrast_range: (f32, f32),
    clip_range: (f32, f32),
}

impl ColorDistort {
    /// Applies the ops of `ordering` to an RGB image in `[0, 1]`.
    pub fn forward<R>(&self, rng: &mut R, rgb: &Array3<f32>, ordering: usize) -> Result<Array3<f32>>
    where
        R: Rng + ?Sized,
    {
        let (_height, _width, channels) = rgb.size3()?;
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );

        let ops = color_ops(ordering, self.fast_mode)?;
        let mut image = rgb.clone();

        for op in ops {
            image = match op {
                ColorOp::Brightness => {
                    let delta = sample_symmetric(rng, self.max_brightness_delta);
                    image + delta
                }
                ColorOp::Saturation => {
                    let factor = sample_range(rng, self.saturation_range);
                    adjust_saturation(&image, factor)?
                }
                ColorOp::Hue => {
                    let delta = sample_symmetric(rng, self.max_hue_delta);
                    adjust_hue(&image, delta)?
                }
                ColorOp::Contrast => {
                    let factor = sample_range(rng, self.contrast_range);
                    adjust_contrast(&image, factor)
                }
            };
        }

        // the ops do not clamp on their own
        let (lower, upper) = self.clip_range;
        image.mapv_inplace(|val| val.clamp(lower, upper));

        Ok(image)
    }
}

fn sample_symmetric<R>(rng: &mut R, max: f32) -> f32
where
    R: Rng + ?Sized,
{
    if max > 0.0 {
        rng.gen_range(-max..=max)
    } else {
        0.0
    }
}

fn sample_range<R>(rng: &mut R, (lower, upper): (f32, f32)) -> f32
where
    R: Rng + ?Sized,
{
    rng.gen_range(lower..=upper)
}

fn adjust_saturation(rgb: &Array3<f32>, factor: f32) -> Result<Array3<f32>> {
    let mut hsv = rgb.rgb_to_hsv()?;
    hsv.slice_mut(s![.., .., 1])
        .mapv_inplace(|sat| (sat * factor).clamp(0.0, 1.0));
    hsv.hsv_to_rgb()
}

fn adjust_hue(rgb: &Array3<f32>, delta: f32) -> Result<Array3<f32>> {
    let mut hsv = rgb.rgb_to_hsv()?;
    hsv.slice_mut(s![.., .., 0])
        .mapv_inplace(|hue| (hue + delta).rem_euclid(1.0));
    hsv.hsv_to_rgb()
}

/// Scales each channel about its spatial mean.
fn adjust_contrast(rgb: &Array3<f32>, factor: f32) -> Array3<f32> {
    let mut output = rgb.clone();
    output.axis_iter_mut(Axis(2)).for_each(|mut channel| {
        let mean = channel.mean().unwrap_or(0.0);
        channel.mapv_inplace(|val| (val - mean) * factor + mean);
    });
    output
}
