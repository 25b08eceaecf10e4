use num_traits::Float;

#[inline]
pub fn lerp<F: Float>(a: F, b: F, t: F) -> F {
    a + (b - a) * t
}

/// Smoothstep ease-in-out over `[0, 1]`, input is clamped.
#[inline]
pub fn ease_in_out<F: Float>(t: F) -> F {
    let t = t.max(F::zero()).min(F::one());
    let two = F::one() + F::one();
    let three = two + F::one();

    t * t * (three - two * t)
}

/// Fraction of `duration` elapsed since `start`, clamped to `[0, 1]`.
/// A non-positive duration counts as already finished.
#[inline]
pub fn progress<F: Float>(start: F, now: F, duration: F) -> F {
    if duration <= F::zero() {
        return F::one();
    }

    ((now - start) / duration).max(F::zero()).min(F::one())
}
