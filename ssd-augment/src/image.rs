//! Image primitives on `(height, width, channel)` arrays.

use crate::common::*;

/// The memory layout of the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    /// Channels interleaved, `(height, width, channel)`.
    #[serde(rename = "NHWC")]
    Nhwc,
    /// Channels planar, `(channel, height, width)`.
    #[serde(rename = "NCHW")]
    Nchw,
}

impl Default for DataFormat {
    fn default() -> Self {
        Self::Nhwc
    }
}

/// Conversion of an image into `f32` values within `[0, 1]`.
pub trait IntoUnitImage {
    fn into_unit_image(self) -> Array3<f32>;
}

impl IntoUnitImage for Array3<u8> {
    fn into_unit_image(self) -> Array3<f32> {
        self.mapv(|val| val as f32 / 255.0)
    }
}

impl IntoUnitImage for &Array3<u8> {
    fn into_unit_image(self) -> Array3<f32> {
        self.mapv(|val| val as f32 / 255.0)
    }
}

/// Float images are assumed to be in `[0, 1]` already.
impl IntoUnitImage for Array3<f32> {
    fn into_unit_image(self) -> Array3<f32> {
        self
    }
}

impl IntoUnitImage for &Array3<f32> {
    fn into_unit_image(self) -> Array3<f32> {
        self.clone()
    }
}

impl IntoUnitImage for ArrayView3<'_, f32> {
    fn into_unit_image(self) -> Array3<f32> {
        self.to_owned()
    }
}

pub trait ImageExt {
    /// Returns `(height, width, channels)` of a non-empty image.
    fn size3(&self) -> Result<(usize, usize, usize)>;

    /// Copies the pixels inside `window`, given in pixel units.
    fn crop_pixels(&self, window: &TLBR<usize>) -> Result<Array3<f32>>;

    /// Bilinear resize without corner alignment.
    ///
    /// Output pixel `y` samples the source at `y * in_h / out_h`, and the
    /// same for columns.
    fn resize_bilinear(&self, new_height: usize, new_width: usize) -> Result<Array3<f32>>;

    fn flip_horizontal(&self) -> Array3<f32>;

    fn rgb_to_hsv(&self) -> Result<Array3<f32>>;

    fn hsv_to_rgb(&self) -> Result<Array3<f32>>;

    fn to_data_format(&self, format: DataFormat) -> Array3<f32>;
}

impl ImageExt for Array3<f32> {
    fn size3(&self) -> Result<(usize, usize, usize)> {
        let (height, width, channels) = self.dim();
        ensure!(
            height > 0 && width > 0 && channels > 0,
            "image must be non-empty, but get shape {:?}",
            self.dim()
        );
        Ok((height, width, channels))
    }

    fn crop_pixels(&self, window: &TLBR<usize>) -> Result<Array3<f32>> {
        let (height, width, _channels) = self.size3()?;
        let [t, l, b, r] = window.tlbr();
        ensure!(
            t < b && l < r && b <= height && r <= width,
            "crop window {:?} is empty or outside the image of size {}x{}",
            window,
            height,
            width
        );
        Ok(self.slice(s![t..b, l..r, ..]).to_owned())
    }

    fn resize_bilinear(&self, new_height: usize, new_width: usize) -> Result<Array3<f32>> {
        let (height, width, channels) = self.size3()?;
        ensure!(
            new_height > 0 && new_width > 0,
            "output size must be positive, but get {}x{}",
            new_height,
            new_width
        );

        let scale_y = height as f32 / new_height as f32;
        let scale_x = width as f32 / new_width as f32;

        // (lower index, upper index, upper weight) per output row/column
        let interp = |scale: f32, size: usize, index: usize| {
            let src = index as f32 * scale;
            let lower = (src.floor() as usize).min(size - 1);
            let upper = (lower + 1).min(size - 1);
            (lower, upper, src - lower as f32)
        };
        let rows: Vec<_> = (0..new_height)
            .map(|y| interp(scale_y, height, y))
            .collect();
        let cols: Vec<_> = (0..new_width)
            .map(|x| interp(scale_x, width, x))
            .collect();

        let resized = Array3::from_shape_fn((new_height, new_width, channels), |(y, x, c)| {
            let (y0, y1, dy) = rows[y];
            let (x0, x1, dx) = cols[x];
            let top = self[[y0, x0, c]] * (1.0 - dx) + self[[y0, x1, c]] * dx;
            let bottom = self[[y1, x0, c]] * (1.0 - dx) + self[[y1, x1, c]] * dx;
            top * (1.0 - dy) + bottom * dy
        });

        Ok(resized)
    }

    fn flip_horizontal(&self) -> Array3<f32> {
        self.slice(s![.., ..;-1, ..]).to_owned()
    }

    fn rgb_to_hsv(&self) -> Result<Array3<f32>> {
        let (_height, _width, channels) = self.size3()?;
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );

        let mut hsv = self.clone();
        hsv.lanes_mut(Axis(2)).into_iter().for_each(|mut pixel| {
            let [h, s, v] = rgb_to_hsv_pixel([pixel[0], pixel[1], pixel[2]]);
            pixel[0] = h;
            pixel[1] = s;
            pixel[2] = v;
        });
        Ok(hsv)
    }

    fn hsv_to_rgb(&self) -> Result<Array3<f32>> {
        let (_height, _width, channels) = self.size3()?;
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );

        let mut rgb = self.clone();
        rgb.lanes_mut(Axis(2)).into_iter().for_each(|mut pixel| {
            let [r, g, b] = hsv_to_rgb_pixel([pixel[0], pixel[1], pixel[2]]);
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
        });
        Ok(rgb)
    }

    fn to_data_format(&self, format: DataFormat) -> Array3<f32> {
        match format {
            DataFormat::Nhwc => self.clone(),
            DataFormat::Nchw => self
                .view()
                .permuted_axes([2, 0, 1])
                .as_standard_layout()
                .into_owned(),
        }
    }
}

/// Hue, saturation and value are all in `[0, 1]` for inputs in `[0, 1]`.
fn rgb_to_hsv_pixel([red, green, blue]: [f32; 3]) -> [f32; 3] {
    let eps = 1e-6;
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);
    let diff = max - min;

    let value = max;
    let saturation = if value > eps { diff / value } else { 0.0 };

    let hue = if diff <= eps {
        0.0
    } else if max == red {
        (green - blue) / diff
    } else if max == green {
        (blue - red) / diff + 2.0
    } else {
        (red - green) / diff + 4.0
    };
    let hue = if hue < 0.0 { hue + 6.0 } else { hue };

    [hue / 6.0, saturation, value]
}

fn hsv_to_rgb_pixel([hue, saturation, value]: [f32; 3]) -> [f32; 3] {
    let channel = |n: f32| {
        let k = (n + hue * 6.0).rem_euclid(6.0);
        value - value * saturation * k.min(4.0 - k).clamp(0.0, 1.0)
    };
    [channel(5.0), channel(3.0), channel(1.0)]
}
