//! Occupancy mask rasterization.

use crate::common::*;

/// Rasterizes normalized boxes into a `height x width` mask with 1 on every
/// cell covered by at least one box.
///
/// A box spans rows `floor(t * height)..ceil(b * height)` and columns
/// `floor(l * width)..ceil(r * width)`, clipped to the mask.
pub fn rasterize_mask<'a>(
    bboxes: impl IntoIterator<Item = &'a TLBR<f64>>,
    out_shape: [usize; 2],
) -> Array2<i32> {
    let [height, width] = out_shape;
    let mut counts = Array2::<i32>::zeros((height, width));

    let pixel_range = |lower: f64, upper: f64, size: usize| {
        let scale = size as f64;
        let begin = (lower * scale).floor().max(0.0).min(scale) as usize;
        let end = (upper * scale).ceil().max(0.0).min(scale) as usize;
        (begin, end)
    };

    for bbox in bboxes {
        let [t, l, b, r] = bbox.tlbr();
        let (min_y, max_y) = pixel_range(t, b, height);
        let (min_x, max_x) = pixel_range(l, r, width);
        if min_y >= max_y || min_x >= max_x {
            continue;
        }
        counts
            .slice_mut(s![min_y..max_y, min_x..max_x])
            .mapv_inplace(|count| count + 1);
    }

    counts.mapv(|count| (count > 0) as i32)
}
