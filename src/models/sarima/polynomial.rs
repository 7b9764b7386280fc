//! Lag polynomials for multiplicative seasonal models.
//!
//! A polynomial `1 + c1 B + c2 B^2 + ...` is stored densely by lag with the
//! lag-0 coefficient fixed at 1.

/// A lag polynomial in the backshift operator `B`.
#[derive(Debug, Clone, PartialEq)]
pub struct LagPolynomial {
    coefficients: Vec<f64>,
}

impl LagPolynomial {
    /// The identity polynomial `1`.
    pub fn one() -> Self {
        Self {
            coefficients: vec![1.0],
        }
    }

    /// `1 + Σ sign * c_i B^(i * stride)` for `i = 1..=len`.
    ///
    /// AR factors use `sign = -1` (`1 - φ1 B - ...`), MA factors `sign = +1`.
    pub fn from_factor(coefficients: &[f64], stride: usize, sign: f64) -> Self {
        let mut dense = vec![0.0; coefficients.len() * stride + 1];
        dense[0] = 1.0;
        for (i, c) in coefficients.iter().enumerate() {
            dense[(i + 1) * stride] = sign * c;
        }
        Self { coefficients: dense }
    }

    /// `(1 - B^stride)^order`.
    pub fn difference(order: usize, stride: usize) -> Self {
        (0..order).fold(Self::one(), |acc, _| {
            acc.multiply(&Self::from_factor(&[1.0], stride, -1.0))
        })
    }

    /// Polynomial product.
    pub fn multiply(&self, other: &Self) -> Self {
        let mut out = vec![0.0; self.degree() + other.degree() + 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            if *a == 0.0 {
                continue;
            }
            for (j, b) in other.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Self { coefficients: out }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Coefficient at `lag` (0 beyond the degree).
    pub fn coefficient(&self, lag: usize) -> f64 {
        self.coefficients.get(lag).copied().unwrap_or(0.0)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Non-zero `(lag, coefficient)` pairs for lags ≥ 1.
    pub fn sparse_tail(&self) -> Vec<(usize, f64)> {
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| **c != 0.0)
            .map(|(lag, &c)| (lag, c))
            .collect()
    }
}

/// First `count` weights of the MA(∞) form `ψ(B) = ma(B) / ar(B)`.
pub fn psi_weights(ar: &LagPolynomial, ma: &LagPolynomial, count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        let mut value = if j == 0 { 1.0 } else { ma.coefficient(j) };
        for k in 1..=j.min(ar.degree()) {
            value -= ar.coefficient(k) * psi[j - k];
        }
        psi.push(value);
    }
    psi
}
