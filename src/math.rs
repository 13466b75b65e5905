use nalgebra as na;
use num_traits::Float;

/// Weight of `f` inside `[from, to]`, `0` at `from` and `1` at `to`.
#[inline]
pub fn frame_weight<T: Float>(from: u32, to: u32, f: u32) -> T {
    let span = T::from(to - from).unwrap_or_else(T::one);
    let offset = T::from(f - from).unwrap_or_else(T::zero);

    offset / span
}

#[inline]
pub fn lerp<T: Float>(a: T, b: T, t: T) -> T {
    a + t * (b - a)
}

pub fn lerp4(a: &[f64; 4], b: &[f64; 4], t: f64) -> [f64; 4] {
    let a = na::Vector4::from(*a);
    let b = na::Vector4::from(*b);

    let v = a.zip_map(&b, |a, b| lerp(a, b, t));

    [v[0], v[1], v[2], v[3]]
}
