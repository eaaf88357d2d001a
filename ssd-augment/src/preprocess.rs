//! The training preprocessing pipeline.

use crate::{
    common::*,
    image::{DataFormat, ImageExt, IntoUnitImage},
    processor::{
        rasterize_mask, ColorDistort, ColorDistortInit, CropOutput, DistortedCrop,
        DistortedCropInit, RandomSelector, Resample, ResampleInit, NUM_COLOR_ORDERINGS,
    },
    utils::Ratio,
};

/// Preprocessor initializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreprocessorInit {
    pub crop: DistortedCropInit,
    pub resample: ResampleInit,
    pub color: ColorDistortInit,
    pub data_format: DataFormat,
}

impl PreprocessorInit {
    /// Default augmentation producing images of `out_shape` in `data_format`.
    pub fn new(out_shape: [usize; 2], data_format: DataFormat) -> Self {
        Self {
            crop: DistortedCropInit::default(),
            resample: ResampleInit {
                out_shape,
                horizontal_flip_prob: Ratio::half(),
            },
            color: ColorDistortInit::default(),
            data_format,
        }
    }

    pub fn build(self) -> Result<Preprocessor> {
        let Self {
            crop,
            resample,
            color,
            data_format,
        } = self;

        Ok(Preprocessor {
            crop: crop.build()?,
            resample: resample.build()?,
            color: color.build()?,
            selector: RandomSelector::new(NUM_COLOR_ORDERINGS)?,
            data_format,
        })
    }
}

/// The augmented sample.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Pixel values in `[0, 255]`, laid out per the data format.
    pub image: Array3<f32>,
    /// Binary occupancy mask of the output shape.
    pub mask: Array2<i32>,
    pub labels: Vec<i64>,
    pub bboxes: Vec<TLBR<f64>>,
    /// The crop window in normalized coordinates of the input image.
    pub window: TLBR<f64>,
}

/// The training preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    crop: DistortedCrop,
    resample: Resample,
    color: ColorDistort,
    selector: RandomSelector,
    data_format: DataFormat,
}

impl Preprocessor {
    pub fn out_shape(&self) -> [usize; 2] {
        self.resample.out_shape()
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    /// Runs [Preprocessor::preprocess_for_train_with_rng] with a freshly
    /// seeded generator.
    pub fn preprocess_for_train<I>(
        &self,
        image: I,
        labels: &[i64],
        bboxes: &[TLBR<f64>],
    ) -> Result<Preprocessed>
    where
        I: IntoUnitImage,
    {
        let mut rng = StdRng::from_entropy();
        self.preprocess_for_train_with_rng(&mut rng, image, labels, bboxes)
    }

    /// Crops, resizes, flips and color distorts the image, then rasterizes
    /// the surviving boxes.
    ///
    /// `labels` and `bboxes` are index-aligned and must have equal length.
    #[instrument(skip_all)]
    pub fn preprocess_for_train_with_rng<R, I>(
        &self,
        rng: &mut R,
        image: I,
        labels: &[i64],
        bboxes: &[TLBR<f64>],
    ) -> Result<Preprocessed>
    where
        R: Rng + ?Sized,
        I: IntoUnitImage,
    {
        let image = image.into_unit_image();
        let (height, width, channels) = image.size3()?;
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );
        ensure!(
            bboxes
                .iter()
                .all(|bbox| bbox.tlbr().iter().all(|val| val.is_finite())),
            "box coordinates must be finite"
        );
        let orig_labels = label::zip_labels(labels.iter().copied(), bboxes.iter().copied())?;
        trace!(
            "input image {}x{} with {} boxes",
            height,
            width,
            orig_labels.len()
        );

        let CropOutput {
            image,
            labels,
            window,
        } = self.crop.forward(rng, &image, &orig_labels)?;
        let (image, labels) = self.resample.forward(rng, &image, labels)?;
        let image = self.selector.apply(rng, image, |rng, image, ordering| {
            self.color.forward(rng, &image, ordering)
        })?;

        let image = (image * 255.0).to_data_format(self.data_format);
        let (labels, bboxes) = label::unzip_labels(labels);
        let mask = rasterize_mask(&bboxes, self.out_shape());

        Ok(Preprocessed {
            image,
            mask,
            labels,
            bboxes,
            window,
        })
    }

    /// Preprocesses a sample.
    ///
    /// Only the training path exists, so `is_training = false` runs it too.
    pub fn preprocess_image<I>(
        &self,
        image: I,
        labels: &[i64],
        bboxes: &[TLBR<f64>],
        is_training: bool,
    ) -> Result<Preprocessed>
    where
        I: IntoUnitImage,
    {
        if !is_training {
            trace!("no evaluation preprocessing, use the training path");
        }
        self.preprocess_for_train(image, labels, bboxes)
    }
}

/// Preprocesses a sample with the default augmentation settings.
pub fn preprocess_image<I>(
    image: I,
    labels: &[i64],
    bboxes: &[TLBR<f64>],
    out_shape: [usize; 2],
    data_format: DataFormat,
    is_training: bool,
) -> Result<Preprocessed>
where
    I: IntoUnitImage,
{
    let preprocessor = PreprocessorInit::new(out_shape, data_format).build()?;
    preprocessor.preprocess_image(image, labels, bboxes, is_training)
}
