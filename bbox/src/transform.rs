use super::{Rect, TLBR};
use crate::{common::*, RectNum, HW};

/// Axis-aligned affine map `y' = sy * y + ty`, `x' = sx * x + tx`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The map taking `src` onto `tgt`.
    pub fn from_rects<R>(src: &R, tgt: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let sy = tgt.h() / src.h();
        let sx = tgt.w() / src.w();
        let ty = tgt.t() - src.t() * sy;
        let tx = tgt.l() - src.l() * sx;

        Self { sy, sx, ty, tx }
    }

    /// The map re-expressing coordinates relative to `frame`, which becomes
    /// the unit frame.
    ///
    /// `frame` must have positive height and width.
    pub fn into_frame(frame: &TLBR<T>) -> Self {
        Self::from_rects(frame, &TLBR::unit())
    }

    /// The map scaling a frame of `src_size` onto `tgt_size` without
    /// preserving the aspect ratio.
    pub fn from_sizes_exact(src_size: &HW<T>, tgt_size: &HW<T>) -> Self {
        let src = TLBR::from_tlhw([T::zero(), T::zero(), src_size.h(), src_size.w()]);
        let tgt = TLBR::from_tlhw([T::zero(), T::zero(), tgt_size.h(), tgt_size.w()]);
        Self::from_rects(&src, &tgt)
    }
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd + Neg<Output = T>,
{
    /// Mirror of the unit frame along the vertical axis, `x' = 1 - x`.
    pub fn hflip() -> Self {
        Self {
            sy: T::one(),
            sx: -T::one(),
            ty: T::zero(),
            tx: T::one(),
        }
    }
}

impl<T> Mul<&TLBR<T>> for &Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = TLBR<T>;

    fn mul(self, rhs: &TLBR<T>) -> Self::Output {
        rhs.transform(self)
    }
}
