//! Resizing and random horizontal flipping.

use crate::{common::*, image::ImageExt, utils::Ratio};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResampleInit {
    /// The output `[height, width]`.
    pub out_shape: [usize; 2],
    pub horizontal_flip_prob: Ratio,
}

impl ResampleInit {
    pub fn build(self) -> Result<Resample> {
        let Self {
            out_shape: [out_h, out_w],
            horizontal_flip_prob,
        } = self;

        let out_h = NonZeroUsize::new(out_h)
            .ok_or_else(|| format_err!("output height must be positive"))?;
        let out_w = NonZeroUsize::new(out_w)
            .ok_or_else(|| format_err!("output width must be positive"))?;

        Ok(Resample {
            out_h,
            out_w,
            horizontal_flip_prob: horizontal_flip_prob.to_f64(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Resample {
    out_h: NonZeroUsize,
    out_w: NonZeroUsize,
    horizontal_flip_prob: f64,
}

impl Resample {
    /// The output `[height, width]`.
    pub fn out_shape(&self) -> [usize; 2] {
        [self.out_h.get(), self.out_w.get()]
    }

    /// Resizes to the output shape. Normalized boxes need no update.
    pub fn resize(&self, image: &Array3<f32>) -> Result<Array3<f32>> {
        image.resize_bilinear(self.out_h.get(), self.out_w.get())
    }

    /// Flips the image and boxes horizontally with the configured probability.
    pub fn random_flip<R>(
        &self,
        rng: &mut R,
        image: Array3<f32>,
        labels: Vec<RatioLabel>,
    ) -> (Array3<f32>, Vec<RatioLabel>)
    where
        R: Rng + ?Sized,
    {
        if rng.gen_bool(self.horizontal_flip_prob) {
            trace!("flip horizontally");
            (image.flip_horizontal(), hflip_labels(&labels))
        } else {
            (image, labels)
        }
    }

    pub fn forward<R>(
        &self,
        rng: &mut R,
        image: &Array3<f32>,
        labels: Vec<RatioLabel>,
    ) -> Result<(Array3<f32>, Vec<RatioLabel>)>
    where
        R: Rng + ?Sized,
    {
        let resized = self.resize(image)?;
        Ok(self.random_flip(rng, resized, labels))
    }
}

/// Mirrors boxes by `x' = 1 - x`, keeping their order.
pub fn hflip_labels(labels: &[RatioLabel]) -> Vec<RatioLabel> {
    let flip = Transform::hflip();
    labels.iter().map(|label| &flip * label).collect_vec()
}
