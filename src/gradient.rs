//! Numerical gradients for models without an analytic one.
//!
//! [`Model::log_density_gradient`](crate::Model::log_density_gradient) falls
//! back to [`FiniteDifference::default`] unless the model overrides it.
//! The returned vector is the derivative of the log density itself, so it
//! points uphill. The Langevin drift in the sampler relies on that sign.

/// How each partial derivative is approximated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceScheme {
    /// `(f(x + eps) - f(x)) / eps`. One extra evaluation per coordinate.
    #[default]
    Forward,
    /// `(f(x + eps) - f(x - eps)) / (2 eps)`. Two extra evaluations per
    /// coordinate, error of order `eps^2`.
    Central,
}

/// Finite difference gradient estimator.
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifference {
    pub epsilon: f64,
    pub scheme: DifferenceScheme,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        FiniteDifference {
            epsilon: 1e-6,
            scheme: DifferenceScheme::Forward,
        }
    }
}

impl FiniteDifference {
    pub fn new(epsilon: f64, scheme: DifferenceScheme) -> Self {
        FiniteDifference { epsilon, scheme }
    }

    /// Evaluate `func` at `position` and estimate its gradient there.
    ///
    /// Coordinates are perturbed one at a time on a scratch copy of
    /// `position`. Non-finite function values propagate into the gradient,
    /// callers decide what to do with them.
    pub fn gradient<F>(&self, func: F, position: &[f64]) -> (f64, Box<[f64]>)
    where
        F: Fn(&[f64]) -> f64,
    {
        let value = func(position);
        let mut point = position.to_vec();
        let mut grad = vec![0f64; position.len()];
        let eps = self.epsilon;

        for (i, out) in grad.iter_mut().enumerate() {
            let orig = point[i];
            *out = match self.scheme {
                DifferenceScheme::Forward => {
                    point[i] = orig + eps;
                    let forward = func(&point);
                    (forward - value) / eps
                }
                DifferenceScheme::Central => {
                    point[i] = orig + eps;
                    let forward = func(&point);
                    point[i] = orig - eps;
                    let backward = func(&point);
                    (forward - backward) / (2. * eps)
                }
            };
            point[i] = orig;
        }

        (value, grad.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn quadratic(x: &[f64]) -> f64 {
        // -0.5 * |x - (1, -2, 3)|^2 with per coordinate scales
        let mu = [1., -2., 3.];
        let scale = [1., 2., 0.5];
        x.iter()
            .zip(mu)
            .zip(scale)
            .map(|((x, mu), s)| -0.5 * s * (x - mu) * (x - mu))
            .sum()
    }

    fn quadratic_grad(x: &[f64]) -> Vec<f64> {
        let mu = [1., -2., 3.];
        let scale = [1., 2., 0.5];
        x.iter()
            .zip(mu)
            .zip(scale)
            .map(|((x, mu), s)| -s * (x - mu))
            .collect()
    }

    #[test]
    fn forward_points_uphill() {
        let fd = FiniteDifference::default();
        let (value, grad) = fd.gradient(|x| -0.5 * x[0] * x[0], &[2.]);
        assert_eq!(value, -2.);
        // d/dx -x^2/2 = -x
        assert_abs_diff_eq!(grad[0], -2., epsilon = 1e-4);
    }

    #[test]
    fn position_is_untouched() {
        let fd = FiniteDifference::new(1e-3, DifferenceScheme::Central);
        let position = [0.5, 0.25, -1.];
        let (_, grad) = fd.gradient(quadratic, &position);
        assert_eq!(position, [0.5, 0.25, -1.]);
        assert_eq!(grad.len(), 3);
    }

    #[test]
    fn neg_infinity_propagates() {
        let fd = FiniteDifference::default();
        let (value, grad) = fd.gradient(|_| f64::NEG_INFINITY, &[0., 1.]);
        assert_eq!(value, f64::NEG_INFINITY);
        assert!(grad.iter().all(|g| !g.is_finite()));
    }

    proptest! {
        #[test]
        fn forward_matches_analytic(x in prop::collection::vec(-5f64..5f64, 3)) {
            let fd = FiniteDifference::default();
            let (value, grad) = fd.gradient(quadratic, &x);
            prop_assert!((value - quadratic(&x)).abs() < 1e-12);
            for (approx, exact) in grad.iter().zip(quadratic_grad(&x)) {
                prop_assert!((approx - exact).abs() < 1e-4);
            }
        }

        #[test]
        fn central_matches_analytic(x in prop::collection::vec(-5f64..5f64, 3)) {
            let fd = FiniteDifference::new(1e-4, DifferenceScheme::Central);
            let (_, grad) = fd.gradient(quadratic, &x);
            for (approx, exact) in grad.iter().zip(quadratic_grad(&x)) {
                prop_assert!((approx - exact).abs() < 1e-6);
            }
        }
    }
}
