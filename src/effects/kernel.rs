use crate::foundation::error::{BackdropError, BackdropResult};

/// Q16 fixed-point one.
pub(crate) const Q16_ONE: u32 = 1 << 16;

/// Normalized 2D Gaussian kernel of side `2r + 1`.
///
/// The Gaussian is separable, so only the normalized 1D factor is stored; the 2D weight
/// at `(dx, dy)` is `k[dx] * k[dy]` and the full matrix sums to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKernel {
    radius: u32,
    sigma: f64,
    weights: Vec<f64>,
}

impl GaussianKernel {
    /// Kernel for `radius` with `sigma = radius / 3`. Radius 0 is the identity kernel.
    pub fn new(radius: u32) -> Self {
        if radius == 0 {
            return Self::identity();
        }
        let sigma = f64::from(radius) / 3.0;
        let weights = normalized_weights(radius, sigma);
        Self {
            radius,
            sigma,
            weights,
        }
    }

    /// Kernel with an explicit sigma.
    pub fn with_sigma(radius: u32, sigma: f64) -> BackdropResult<Self> {
        if radius == 0 {
            return Ok(Self::identity());
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(BackdropError::validation("blur sigma must be > 0"));
        }
        Ok(Self {
            radius,
            sigma,
            weights: normalized_weights(radius, sigma),
        })
    }

    fn identity() -> Self {
        Self {
            radius: 0,
            sigma: 0.0,
            weights: vec![1.0],
        }
    }

    /// Kernel radius `r`.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Gaussian sigma (0 for the identity kernel).
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Side length `2r + 1`.
    pub fn side(&self) -> usize {
        self.weights.len()
    }

    /// Normalized 1D factor, indexed by `offset + r`.
    pub fn weights_1d(&self) -> &[f64] {
        &self.weights
    }

    /// 2D weight at offset `(dx, dy)`; `0.0` outside the `[-r, r]` support.
    pub fn weight(&self, dx: i32, dy: i32) -> f64 {
        self.tap(dx) * self.tap(dy)
    }

    fn tap(&self, offset: i32) -> f64 {
        let idx = i64::from(offset) + i64::from(self.radius);
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.weights.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    /// Full `side * side` row-major weight matrix.
    pub fn to_matrix(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.side() * self.side());
        for wy in &self.weights {
            for wx in &self.weights {
                out.push(wy * wx);
            }
        }
        out
    }

    /// 1D factor quantized to Q16 with the rounding residue folded into the center tap,
    /// so the taps sum to exactly `1 << 16`.
    pub(crate) fn quantize_q16(&self) -> Vec<u32> {
        let mut q: Vec<u32> = self
            .weights
            .iter()
            .map(|&w| ((w * f64::from(Q16_ONE)).round() as i64).clamp(0, i64::from(Q16_ONE)) as u32)
            .collect();
        let acc: i64 = q.iter().map(|&v| i64::from(v)).sum();
        let delta = i64::from(Q16_ONE) - acc;
        if delta != 0 {
            let mid = q.len() / 2;
            q[mid] = (i64::from(q[mid]) + delta).clamp(0, i64::from(Q16_ONE)) as u32;
        }
        q
    }
}

fn normalized_weights(radius: u32, sigma: f64) -> Vec<f64> {
    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    // The center tap is exp(0) = 1, so the sum is never zero.
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

#[cfg(test)]
#[path = "../../tests/unit/effects/kernel.rs"]
mod tests;
