use super::Rect;
use crate::{common::*, Transform};

/// Bounding box in TLBR format.
///
/// In normalized frames, `t`/`b` are `ymin`/`ymax` and `l`/`r` are
/// `xmin`/`xmax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T> {
    pub fn try_cast<V>(self) -> Option<TLBR<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(TLBR {
            t: V::from(self.t)?,
            l: V::from(self.l)?,
            b: V::from(self.b)?,
            r: V::from(self.r)?,
        })
    }

    pub fn cast<V>(self) -> TLBR<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The box spanning the whole unit frame.
    pub fn unit() -> Self {
        Self {
            t: T::zero(),
            l: T::zero(),
            b: T::one(),
            r: T::one(),
        }
    }

    /// Maps the corners by `transform`.
    ///
    /// A negative scale mirrors the box, so the corners are swapped to keep
    /// `t <= b` and `l <= r`.
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        let y1 = self.t * transform.sy + transform.ty;
        let y2 = self.b * transform.sy + transform.ty;
        let x1 = self.l * transform.sx + transform.tx;
        let x2 = self.r * transform.sx + transform.tx;

        let (t, b) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        let (l, r) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };

        TLBR { t, l, b, r }
    }
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");

        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "box height and width must be non-negative"
        );
        Self::try_from_tlbr([t, l, t + h, l + w])
    }
}
