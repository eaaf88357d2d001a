use super::TLBR;
use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd + Copy,
{
    fn from_tlbr(tlbr: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlbr(tlbr).unwrap()
    }

    fn from_tlhw(tlhw: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlhw(tlhw).unwrap()
    }

    fn tlbr(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.b(), self.r()]
    }

    fn area(&self) -> Self::Type {
        self.h() * self.w()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    fn intersect_with<R>(&self, other: &R) -> Option<TLBR<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let t = self.t().max(other.t());
        let l = self.l().max(other.l());
        let b = self.b().min(other.b());
        let r = self.r().min(other.r());
        (b > t && r > l).then(|| TLBR { t, l, b, r })
    }

    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        self.intersect_with(other)
            .map(|rect| rect.area())
            .unwrap_or_else(Self::Type::zero)
    }

    /// The fraction of this rectangle's area that lies inside `region`.
    ///
    /// Degenerate rectangles have zero coverage.
    fn coverage_by<R>(&self, region: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let area = self.area();
        if area <= Self::Type::zero() {
            return Self::Type::zero();
        }
        self.intersection_area_with(region) / area
    }

    /// Clamps the corners into `[lower, upper]` on both axes.
    fn clamp(&self, lower: Self::Type, upper: Self::Type) -> TLBR<Self::Type> {
        let clamp = |val: Self::Type| val.max(lower).min(upper);
        TLBR {
            t: clamp(self.t()),
            l: clamp(self.l()),
            b: clamp(self.b()),
            r: clamp(self.r()),
        }
    }

    /// Clamps the corners into the unit frame.
    fn clamp_unit(&self) -> TLBR<Self::Type> {
        self.clamp(Self::Type::zero(), Self::Type::one())
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd + Copy,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}
