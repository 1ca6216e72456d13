use std::f64::consts::PI;

use itertools::izip;
use multiversion::multiversion;

#[inline]
pub(crate) fn logaddexp(a: f64, b: f64) -> f64 {
    if a == b {
        return a + 2f64.ln();
    }
    let diff = a - b;
    if diff > 0. {
        a + (-diff).exp().ln_1p()
    } else if diff < 0. {
        b + diff.exp().ln_1p()
    } else {
        // diff is NAN
        diff
    }
}

/// `ln(sum(exp(values)))` without overflowing on large or
/// underflowing on very negative entries.
pub fn logsumexp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

#[inline]
pub(crate) fn normal_logpdf(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    -0.5 * z * z - sigma.ln() - 0.5 * (2. * PI).ln()
}

/// Evenly spaced values over `[start, end]`, both ends included.
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[multiversion(targets("x86_64+avx+avx2+fma", "x86+sse"))]
pub(crate) fn vector_dot(a: &[f64], b: &[f64]) -> f64 {
    assert!(a.len() == b.len());
    izip!(a, b).map(|(a, b)| a * b).sum()
}

/// `out[i] -= |x[i]|`
#[multiversion(targets("x86_64+avx+avx2+fma", "x86+sse"))]
pub(crate) fn sub_abs(out: &mut [f64], x: &[f64]) {
    assert!(out.len() == x.len());
    izip!(out, x).for_each(|(out, x)| {
        *out -= x.abs();
    });
}

/// `out[i] += -0.5 * x[i]^2`
#[multiversion(targets("x86_64+avx+avx2+fma", "x86+sse"))]
pub(crate) fn add_half_square(out: &mut [f64], x: &[f64]) {
    assert!(out.len() == x.len());
    izip!(out, x).for_each(|(out, x)| {
        *out -= 0.5 * x * x;
    });
}
