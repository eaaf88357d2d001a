//! Random cropping constrained by the bounding boxes.

use crate::{common::*, image::ImageExt};

/// Random box-aware cropping initializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistortedCropInit {
    /// The window must cover at least this fraction of some box.
    pub min_object_covered: R64,
    /// Bounds of the window width to height ratio.
    pub aspect_ratio_range: (R64, R64),
    /// Bounds of the window area as a fraction of the image area.
    pub area_range: (R64, R64),
    /// The number of sampled windows before falling back to the entire image.
    pub max_attempts: usize,
    /// Boxes must overlap the window by more than this fraction to survive.
    pub min_overlap: R64,
}

impl DistortedCropInit {
    pub fn build(self) -> Result<DistortedCrop> {
        let Self {
            min_object_covered,
            aspect_ratio_range: (min_aspect, max_aspect),
            area_range: (min_area, max_area),
            max_attempts,
            min_overlap,
        } = self;

        ensure!(
            (0.0..=1.0).contains(&min_object_covered.raw()),
            "min_object_covered must be in range [0.0, 1.0]"
        );
        ensure!(min_aspect > 0.0, "aspect ratio lower bound must be positive");
        ensure!(
            min_aspect <= max_aspect,
            "aspect ratio lower bound must not exceed upper bound"
        );
        ensure!(
            min_area > 0.0 && max_area <= 1.0 && min_area <= max_area,
            "area_range must satisfy 0.0 < lower <= upper <= 1.0"
        );
        ensure!(
            (0.0..1.0).contains(&min_overlap.raw()),
            "min_overlap must be in range [0.0, 1.0)"
        );

        Ok(DistortedCrop {
            min_object_covered: min_object_covered.raw(),
            aspect_ratio_range: (min_aspect.raw(), max_aspect.raw()),
            area_range: (min_area.raw(), max_area.raw()),
            max_attempts,
            min_overlap: min_overlap.raw(),
        })
    }
}

impl Default for DistortedCropInit {
    fn default() -> Self {
        Self {
            min_object_covered: r64(0.9),
            aspect_ratio_range: (r64(0.8), r64(1.2)),
            area_range: (r64(0.1), r64(1.0)),
            max_attempts: 500,
            min_overlap: r64(0.1),
        }
    }
}

/// The cropped image with boxes expressed in the window frame.
#[derive(Debug, Clone)]
pub struct CropOutput {
    pub image: Array3<f32>,
    pub labels: Vec<RatioLabel>,
    /// The crop window in normalized coordinates of the input image.
    pub window: TLBR<f64>,
}

/// Random box-aware cropping.
#[derive(Debug, Clone)]
pub struct DistortedCrop {
    min_object_covered: f64,
    aspect_ratio_range: (f64, f64),
    area_range: (f64, f64),
    max_attempts: usize,
    min_overlap: f64,
}

impl DistortedCrop {
    #[instrument(skip_all)]
    pub fn forward<R>(
        &self,
        rng: &mut R,
        image: &Array3<f32>,
        labels: &[RatioLabel],
    ) -> Result<CropOutput>
    where
        R: Rng + ?Sized,
    {
        let (height, width, _channels) = image.size3()?;

        let bboxes: Vec<_> = labels.iter().map(|label| label.rect).collect();
        let pixel_window = self.sample_window(rng, height, width, &bboxes)?;
        let cropped = image.crop_pixels(&pixel_window)?;

        let window = {
            let [t, l, b, r] = pixel_window.tlbr();
            let (height, width) = (height as f64, width as f64);
            TLBR::try_from_tlbr([
                t as f64 / height,
                l as f64 / width,
                b as f64 / height,
                r as f64 / width,
            ])?
        };
        let new_labels = remap_labels(labels, &window, self.min_overlap);

        trace!(
            "crop window {:?}, {} of {} boxes kept",
            window.tlbr(),
            new_labels.len(),
            labels.len()
        );

        Ok(CropOutput {
            image: cropped,
            labels: new_labels,
            window,
        })
    }

    /// Samples a crop window in pixel units for an image of the given size.
    ///
    /// Without boxes, the whole image is the reference box. If no window
    /// satisfies the constraints, the entire image is returned.
    pub fn sample_window<R>(
        &self,
        rng: &mut R,
        height: usize,
        width: usize,
        bboxes: &[TLBR<f64>],
    ) -> Result<TLBR<usize>>
    where
        R: Rng + ?Sized,
    {
        ensure!(
            height > 0 && width > 0,
            "image size must be positive, but get {}x{}",
            height,
            width
        );
        let Self {
            min_object_covered,
            aspect_ratio_range: (min_aspect, max_aspect),
            area_range,
            max_attempts,
            ..
        } = *self;

        let image_size = HW::try_from_hw([height as f64, width as f64])?;
        let to_pixels = Transform::from_sizes_exact(&HW::unit(), &image_size);
        let pixel_bboxes: Vec<_> = if bboxes.is_empty() {
            vec![TLBR::try_from_tlhw([0.0, 0.0, image_size.h(), image_size.w()])?]
        } else {
            bboxes.iter().map(|bbox| &to_pixels * bbox).collect()
        };
        let min_area = area_range.0 * image_size.area();
        let max_area = area_range.1 * image_size.area();

        for _ in 0..max_attempts {
            let aspect_ratio = rng.gen_range(min_aspect..=max_aspect);
            let window =
                match generate_random_crop(rng, height, width, aspect_ratio, min_area, max_area) {
                    Some(window) => window,
                    None => continue,
                };
            let window_f64 = window.cast::<f64>();

            let covered = pixel_bboxes
                .iter()
                .any(|bbox| bbox.coverage_by(&window_f64) >= min_object_covered);
            if covered {
                return Ok(window);
            }
        }

        debug!(
            "no crop window satisfies the constraints after {} attempts, use the entire image",
            max_attempts
        );
        TLBR::try_from_tlhw([0, 0, height, width])
    }
}

/// Draws a window of the given aspect ratio whose area lies in
/// `[min_area, max_area]`, or `None` if the draw does not fit.
fn generate_random_crop<R>(
    rng: &mut R,
    height: usize,
    width: usize,
    aspect_ratio: f64,
    min_area: f64,
    max_area: f64,
) -> Option<TLBR<usize>>
where
    R: Rng + ?Sized,
{
    let image_h = height as f64;
    let image_w = width as f64;

    let mut max_crop_h = (max_area / aspect_ratio).sqrt().round();
    if (max_crop_h * aspect_ratio).round() > image_w {
        max_crop_h = ((image_w + 0.5 - 1e-7) / aspect_ratio).floor();
    }
    let max_crop_h = max_crop_h.min(image_h);
    let min_crop_h = (min_area / aspect_ratio).sqrt().round().min(max_crop_h);

    let mut crop_h = min_crop_h;
    if max_crop_h > min_crop_h {
        crop_h += rng.gen_range(0..=(max_crop_h - min_crop_h) as usize) as f64;
    }
    let mut crop_w = (crop_h * aspect_ratio).round();

    // rounding may leave the area just below the bound
    if crop_h * crop_w < min_area {
        crop_h += 1.0;
        crop_w = (crop_h * aspect_ratio).round();
    }

    let area = crop_h * crop_w;
    if area < min_area
        || area > max_area
        || crop_h < 1.0
        || crop_w < 1.0
        || crop_h > image_h
        || crop_w > image_w
    {
        return None;
    }

    let crop_h = crop_h as usize;
    let crop_w = crop_w as usize;
    let top = rng.gen_range(0..=(height - crop_h));
    let left = rng.gen_range(0..=(width - crop_w));
    TLBR::try_from_tlhw([top, left, crop_h, crop_w]).ok()
}

/// Re-expresses boxes in the frame of `window`, drops those overlapping the
/// window by no more than `min_overlap` of their area, and clips the rest.
pub fn remap_labels(labels: &[RatioLabel], window: &TLBR<f64>, min_overlap: f64) -> Vec<RatioLabel> {
    let transform = Transform::into_frame(window);
    let frame = TLBR::unit();

    labels
        .iter()
        .map(|label| &transform * label)
        .filter(|label| label.coverage_by(&frame) > min_overlap)
        .map(|label| label.clamp_unit())
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn label(tlbr: [f64; 4], class: i64) -> RatioLabel {
        Label {
            rect: TLBR::from_tlbr(tlbr),
            class,
        }
    }

    fn assert_proper_unit_box(rect: &TLBR<f64>) {
        let [t, l, b, r] = rect.tlbr();
        assert!(0.0 <= t && t < b && b <= 1.0, "invalid box {:?}", rect);
        assert!(0.0 <= l && l < r && r <= 1.0, "invalid box {:?}", rect);
    }

    #[test]
    fn remap_into_window() {
        let window = TLBR::from_tlbr([0.0, 0.5, 0.5, 1.0]);
        let labels = vec![
            label([0.1, 0.6, 0.3, 0.8], 1),
            // mostly outside, 1/9 of the area is inside
            label([0.0, 0.0, 0.4, 0.5625], 2),
            // entirely outside
            label([0.6, 0.0, 0.9, 0.4], 3),
            // straddling the border
            label([0.25, 0.75, 0.75, 1.0], 4),
        ];
        let remapped = remap_labels(&labels, &window, 0.1);
        assert_eq!(
            remapped.iter().map(|label| label.class).collect_vec(),
            vec![1, 2, 4]
        );

        let [t, l, b, r] = remapped[0].rect.tlbr();
        assert_abs_diff_eq!(t, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(l, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(b, 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(r, 0.6, epsilon = 1e-9);

        let [t, _l, b, r] = remapped[2].rect.tlbr();
        assert_abs_diff_eq!(t, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(b, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r, 1.0, epsilon = 1e-9);

        remapped
            .iter()
            .for_each(|label| assert_proper_unit_box(&label.rect));

        // raising the threshold drops the barely overlapping box
        let remapped = remap_labels(&labels, &window, 0.2);
        assert_eq!(
            remapped.iter().map(|label| label.class).collect_vec(),
            vec![1, 4]
        );
    }

    #[test]
    fn zero_attempts_use_entire_image() {
        let crop = DistortedCropInit {
            max_attempts: 0,
            ..Default::default()
        }
        .build()
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let image = Array3::from_shape_fn((20, 30, 3), |(y, x, c)| (y + x + c) as f32 / 60.0);
        let labels = vec![label([0.1, 0.1, 0.5, 0.5], 1), label([0.5, 0.2, 0.9, 0.7], 2)];

        let output = crop.forward(&mut rng, &image, &labels).unwrap();
        assert_eq!(output.image, image);
        assert_eq!(output.window, TLBR::unit());
        assert_eq!(output.labels.len(), 2);
        output
            .labels
            .iter()
            .zip_eq(&labels)
            .for_each(|(new, orig)| {
                assert_eq!(new.class, orig.class);
                new.rect
                    .tlbr()
                    .iter()
                    .zip(orig.rect.tlbr())
                    .for_each(|(&lhs, rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-9));
            });
    }

    #[test]
    fn unsatisfiable_constraints_fall_back() {
        // a window of at most half the image never covers 90% of the full-image box
        let crop = DistortedCropInit {
            area_range: (r64(0.1), r64(0.5)),
            max_attempts: 50,
            ..Default::default()
        }
        .build()
        .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let window = crop
            .sample_window(&mut rng, 40, 40, &[TLBR::unit()])
            .unwrap();
        assert_eq!(window.tlbr(), [0, 0, 40, 40]);
    }

    #[test]
    fn sampled_windows_satisfy_constraints() {
        let crop = DistortedCropInit::default().build().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let bbox = TLBR::from_tlbr([0.3, 0.2, 0.6, 0.5]);
        let pixel_bbox = TLBR::from_tlbr([30.0, 40.0, 60.0, 100.0]);

        for _ in 0..100 {
            let window = crop.sample_window(&mut rng, 100, 200, &[bbox]).unwrap();
            let [t, l, b, r] = window.tlbr();
            assert!(t < b && l < r && b <= 100 && r <= 200);

            if window.tlbr() == [0, 0, 100, 200] {
                continue;
            }
            let area = ((b - t) * (r - l)) as f64;
            assert!((0.1 * 20000.0..=20000.0).contains(&area));
            let aspect = (r - l) as f64 / (b - t) as f64;
            assert!((0.7..=1.3).contains(&aspect), "aspect ratio {}", aspect);
            assert!(pixel_bbox.coverage_by(&window.cast::<f64>()) >= 0.9 - 1e-9);
        }
    }

    #[test]
    fn surviving_boxes_stay_in_unit_frame() {
        let crop = DistortedCropInit {
            min_object_covered: r64(0.1),
            ..Default::default()
        }
        .build()
        .unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let image = Array3::zeros((64, 48, 3));

        for _ in 0..50 {
            let labels: Vec<_> = (0..5)
                .map(|class| {
                    let t = rng.gen_range(0.0..0.9);
                    let l = rng.gen_range(0.0..0.9);
                    let b = rng.gen_range((t + 0.01)..=1.0);
                    let r = rng.gen_range((l + 0.01)..=1.0);
                    label([t, l, b, r], class)
                })
                .collect();

            let output = crop.forward(&mut rng, &image, &labels).unwrap();
            assert_eq!(output.image.dim().2, 3);
            assert_proper_unit_box(&output.window);
            output
                .labels
                .iter()
                .for_each(|label| assert_proper_unit_box(&label.rect));
        }
    }

    #[test]
    fn empty_labels_are_not_an_error() {
        let crop = DistortedCropInit::default().build().unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let image = Array3::zeros((30, 30, 3));
        let output = crop.forward(&mut rng, &image, &[]).unwrap();
        assert!(output.labels.is_empty());
    }

    #[test]
    fn rejects_invalid_config() {
        let init = DistortedCropInit {
            area_range: (r64(0.0), r64(1.0)),
            ..Default::default()
        };
        assert!(init.build().is_err());

        let init = DistortedCropInit {
            aspect_ratio_range: (r64(1.2), r64(0.8)),
            ..Default::default()
        };
        assert!(init.build().is_err());

        let init = DistortedCropInit {
            min_object_covered: r64(1.5),
            ..Default::default()
        };
        assert!(init.build().is_err());
    }
}
