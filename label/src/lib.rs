use anyhow::{ensure, Result};
use bbox::{Rect, RectFloat, Transform, TLBR};
use num_traits::Float;
use std::ops::Mul;

/// A bounding box paired with its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<T, C> Label<TLBR<T>, C>
where
    T: Float,
{
    /// The fraction of the box area lying inside `region`.
    pub fn coverage_by(&self, region: &TLBR<T>) -> T {
        self.rect.coverage_by(region)
    }

    /// Clamps the box into the unit frame, keeping the class.
    pub fn clamp_unit(&self) -> Self
    where
        C: Clone,
    {
        Label {
            rect: self.rect.clamp_unit(),
            class: self.class.clone(),
        }
    }
}

impl<'a, T, C> Mul<&'a Label<TLBR<T>, C>> for &'a Transform<T>
where
    T: Copy + num_traits::Num + PartialOrd,
    C: Copy,
{
    type Output = Label<TLBR<T>, C>;

    fn mul(self, rhs: &'a Label<TLBR<T>, C>) -> Self::Output {
        Label {
            rect: self * &rhs.rect,
            class: rhs.class,
        }
    }
}

/// Pairs index-aligned class and box sequences.
pub fn zip_labels<R, C>(
    classes: impl IntoIterator<Item = C>,
    rects: impl IntoIterator<Item = R>,
) -> Result<Vec<Label<R, C>>>
where
    R: Rect,
{
    let classes: Vec<_> = classes.into_iter().collect();
    let rects: Vec<_> = rects.into_iter().collect();
    ensure!(
        classes.len() == rects.len(),
        "the number of labels ({}) and boxes ({}) must match",
        classes.len(),
        rects.len()
    );

    let labels = classes
        .into_iter()
        .zip(rects)
        .map(|(class, rect)| Label { rect, class })
        .collect();
    Ok(labels)
}

/// Splits labels back into index-aligned class and box sequences.
pub fn unzip_labels<R, C>(labels: impl IntoIterator<Item = Label<R, C>>) -> (Vec<C>, Vec<R>)
where
    R: Rect,
{
    labels
        .into_iter()
        .map(|Label { rect, class }| (class, rect))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bbox::RectNum;

    #[test]
    fn zip_and_unzip() {
        let rects = vec![
            TLBR::from_tlbr([0.0, 0.0, 0.5, 0.5]),
            TLBR::from_tlbr([0.5, 0.5, 1.0, 1.0]),
        ];
        let labels = zip_labels(vec![3i64, 7], rects.clone()).unwrap();
        assert_eq!(labels[1].class, 7);

        let (classes, unzipped) = unzip_labels(labels);
        assert_eq!(classes, vec![3, 7]);
        assert_eq!(unzipped, rects);
    }

    #[test]
    fn zip_rejects_length_mismatch() {
        let rects = vec![TLBR::from_tlbr([0.0, 0.0, 0.5, 0.5])];
        assert!(zip_labels(vec![1i64, 2], rects).is_err());
    }

    #[test]
    fn transform_label() {
        let label = Label {
            rect: TLBR::from_tlbr([0.1, 0.2, 0.3, 0.6]),
            class: 4i64,
        };
        let flipped = &Transform::hflip() * &label;
        assert_eq!(flipped.class, 4);
        assert_abs_diff_eq!(flipped.rect.l(), 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(flipped.rect.r(), 0.8, epsilon = 1e-9);
    }
}
