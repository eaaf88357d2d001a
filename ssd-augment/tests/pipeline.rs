use anyhow::Result;
use bbox::{prelude::*, TLBR};
use ndarray::Array3;
use rand::prelude::*;
use ssd_augment::{preprocess_image, DataFormat, PreprocessorConfig, PreprocessorInit};

fn checkerboard(height: usize, width: usize) -> Array3<u8> {
    Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
        if (y / 10 + x / 10) % 2 == 0 {
            200 - c as u8 * 30
        } else {
            20 + c as u8 * 30
        }
    })
}

#[test]
fn centered_box_survives() -> Result<()> {
    let preprocessor = PreprocessorInit::new([50, 50], DataFormat::Nhwc).build()?;
    let image = checkerboard(100, 100);
    let bboxes = [TLBR::from_tlbr([0.25, 0.25, 0.75, 0.75])];

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let output = preprocessor.preprocess_for_train_with_rng(&mut rng, &image, &[1], &bboxes)?;

        assert_eq!(output.image.dim(), (50, 50, 3));
        assert!(output.image.iter().all(|&val| (0.0..=255.0).contains(&val)));
        assert_eq!(output.mask.dim(), (50, 50));
        assert!(output.mask.iter().all(|&val| val == 0 || val == 1));
        assert!(output.mask.iter().any(|&val| val == 1));
        assert_eq!(output.labels, vec![1]);
        assert_eq!(output.bboxes.len(), 1);

        let [t, l, b, r] = output.bboxes[0].tlbr();
        assert!(0.0 <= t && t < b && b <= 1.0);
        assert!(0.0 <= l && l < r && r <= 1.0);

        let [wt, wl, wb, wr] = output.window.tlbr();
        assert!(0.0 <= wt && wt < wb && wb <= 1.0);
        assert!(0.0 <= wl && wl < wr && wr <= 1.0);
    }

    Ok(())
}

#[test]
fn mask_matches_final_boxes() -> Result<()> {
    let preprocessor = PreprocessorInit::new([40, 60], DataFormat::Nhwc).build()?;
    let image = checkerboard(80, 120);
    let bboxes = [
        TLBR::from_tlbr([0.1, 0.1, 0.4, 0.3]),
        TLBR::from_tlbr([0.5, 0.6, 0.9, 0.95]),
    ];
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..10 {
        let output = preprocessor.preprocess_for_train_with_rng(&mut rng, &image, &[2, 9], &bboxes)?;
        assert_eq!(output.labels.len(), output.bboxes.len());
        assert!(output.labels.iter().all(|&class| class == 2 || class == 9));

        // every cell strictly inside a final box is set
        output.bboxes.iter().for_each(|bbox| {
            let [t, l, b, r] = bbox.tlbr();
            let y = ((t + b) / 2.0 * 40.0).floor() as usize;
            let x = ((l + r) / 2.0 * 60.0).floor() as usize;
            assert_eq!(output.mask[[y.min(39), x.min(59)]], 1);
        });
        if output.bboxes.is_empty() {
            assert!(output.mask.iter().all(|&val| val == 0));
        }
    }

    Ok(())
}

#[test]
fn planar_output() -> Result<()> {
    let image = checkerboard(64, 48);
    let bboxes = [TLBR::from_tlbr([0.2, 0.2, 0.8, 0.8])];
    let output = preprocess_image(&image, &[3], &bboxes, [32, 24], DataFormat::Nchw, true)?;
    assert_eq!(output.image.dim(), (3, 32, 24));
    assert_eq!(output.mask.dim(), (32, 24));
    Ok(())
}

#[test]
fn evaluation_flag_runs_training_path() -> Result<()> {
    let image = checkerboard(30, 30);
    let output = preprocess_image(&image, &[], &[], [16, 16], DataFormat::Nhwc, false)?;
    assert_eq!(output.image.dim(), (16, 16, 3));
    assert!(output.bboxes.is_empty());
    assert!(output.mask.iter().all(|&val| val == 0));
    Ok(())
}

#[test]
fn float_input_is_accepted() -> Result<()> {
    let preprocessor = PreprocessorInit::new([10, 10], DataFormat::Nhwc).build()?;
    let image = Array3::<f32>::from_elem((20, 20, 3), 0.5);
    let output = preprocessor.preprocess_for_train(&image, &[], &[])?;
    assert!(output.image.iter().all(|&val| (0.0..=255.0).contains(&val)));

    let output = preprocessor.preprocess_for_train(image, &[], &[])?;
    assert_eq!(output.image.dim(), (10, 10, 3));
    Ok(())
}

#[test]
fn invalid_inputs_are_rejected() -> Result<()> {
    let preprocessor = PreprocessorInit::new([10, 10], DataFormat::Nhwc).build()?;
    let bbox = TLBR::from_tlbr([0.0, 0.0, 0.5, 0.5]);

    // labels and boxes differ in length
    assert!(preprocessor
        .preprocess_for_train(checkerboard(20, 20), &[], &[bbox])
        .is_err());
    // empty image
    assert!(preprocessor
        .preprocess_for_train(Array3::<u8>::zeros((0, 20, 3)), &[], &[])
        .is_err());
    // grayscale image
    assert!(preprocessor
        .preprocess_for_train(Array3::<u8>::zeros((20, 20, 1)), &[], &[])
        .is_err());

    Ok(())
}

#[test]
fn pipeline_from_config() -> Result<()> {
    let config: PreprocessorConfig = r#"
    {
        out_shape: [24, 32],
        data_format: "NCHW",
        fast_mode: true,
        max_attempts: 0,
        horizontal_flip_prob: 0.0,
    }
    "#
    .parse()?;
    let preprocessor = config.build()?;

    let image = checkerboard(48, 64);
    let bboxes = [TLBR::from_tlbr([0.0, 0.0, 1.0, 1.0])];
    let mut rng = StdRng::seed_from_u64(3);
    let output = preprocessor.preprocess_for_train_with_rng(&mut rng, &image, &[5], &bboxes)?;

    // no crop search and no flip keep the full-frame box intact
    assert_eq!(output.window, TLBR::from_tlbr([0.0, 0.0, 1.0, 1.0]));
    assert_eq!(output.bboxes, vec![TLBR::from_tlbr([0.0, 0.0, 1.0, 1.0])]);
    assert_eq!(output.image.dim(), (3, 24, 32));
    assert!(output.mask.iter().all(|&val| val == 1));

    Ok(())
}
