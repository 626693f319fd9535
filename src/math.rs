use itertools::izip;
use statrs::consts::LN_SQRT_2PI;

const LN_2PI: f64 = 2.0 * LN_SQRT_2PI;

/// `out = y + a * x`
pub(crate) fn axpy_out(x: &[f64], y: &[f64], a: f64, out: &mut [f64]) {
    let n = x.len();
    assert!(y.len() == n);
    assert!(out.len() == n);

    izip!(x, y, out).for_each(|(x, y, out)| {
        *out = a * x + y;
    });
}

/// `y += a * x`
pub(crate) fn axpy(x: &[f64], y: &mut [f64], a: f64) {
    assert!(x.len() == y.len());

    izip!(x, y).for_each(|(x, y)| {
        *y += a * x;
    });
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    assert!(a.len() == b.len());
    izip!(a, b)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}

/// Log density of `N(mean, scale^2 I)` at `x`.
pub(crate) fn isotropic_normal_logpdf(x: &[f64], mean: &[f64], scale: f64) -> f64 {
    let n = x.len() as f64;
    let dist = squared_distance(x, mean);
    -0.5 * dist / (scale * scale) - n * scale.ln() - 0.5 * n * LN_2PI
}

pub(crate) fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|val| val.is_finite())
}

/// Map a real number to (0, 1).
#[inline]
pub fn inv_logit(x: f64) -> f64 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        let e = x.exp();
        e / (1. + e)
    }
}

/// `ln(1 + exp(x))` without overflow for large `x`.
#[inline]
pub(crate) fn log1p_exp(x: f64) -> f64 {
    x.max(0.) + (-x.abs()).exp().ln_1p()
}

#[inline]
pub fn logit(p: f64) -> f64 {
    p.ln() - (-p).ln_1p()
}
