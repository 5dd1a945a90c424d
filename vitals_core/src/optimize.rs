//! Derivative-free minimization (Nelder–Mead simplex).
//!
//! Used by the ARIMA estimator, whose conditional sum-of-squares objective
//! has no convenient closed-form gradient once the coefficients go through
//! the stationarity transform.

use std::cmp::Ordering;

/// Nelder–Mead settings
#[derive(Clone, Debug)]
pub struct NelderMead {
    pub max_iterations: usize,
    /// Absolute spread of simplex vertices required for convergence
    pub xatol: f64,
    /// Absolute spread of objective values required for convergence
    pub fatol: f64,
    /// Offset of the initial simplex vertices from the start point
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2_000,
            xatol: 1e-6,
            fatol: 1e-9,
            initial_step: 0.1,
        }
    }
}

/// Outcome of a minimization run
#[derive(Clone, Debug)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    /// Minimize `f` starting from `start`
    ///
    /// Non-finite objective values are treated as +inf, so callers can fence
    /// off infeasible regions by returning `f64::INFINITY`.
    pub fn minimize<F>(&self, f: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() {
                v
            } else {
                f64::INFINITY
            }
        };

        let n = start.len();
        if n == 0 {
            return Minimum {
                point: Vec::new(),
                value: eval(start),
                iterations: 0,
                converged: true,
            };
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), eval(start)));
        for i in 0..n {
            let mut vertex = start.to_vec();
            let step = if vertex[i] != 0.0 {
                self.initial_step * vertex[i].abs().max(1.0)
            } else {
                self.initial_step
            };
            vertex[i] += step;
            let value = eval(&vertex);
            simplex.push((vertex, value));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            if self.has_converged(&simplex) {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid = centroid(&simplex[..n]);
            let worst = simplex[n].clone();
            let best_value = simplex[0].1;
            let second_worst_value = simplex[n - 1].1;

            let reflected = affine(&centroid, &worst.0, -REFLECT);
            let reflected_value = eval(&reflected);

            if reflected_value < best_value {
                let expanded = affine(&centroid, &worst.0, -EXPAND);
                let expanded_value = eval(&expanded);
                simplex[n] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }

            if reflected_value < second_worst_value {
                simplex[n] = (reflected, reflected_value);
                continue;
            }

            let contracted = if reflected_value < worst.1 {
                // outside contraction, towards the reflected point
                let point = affine(&centroid, &reflected, CONTRACT);
                let value = eval(&point);
                (value <= reflected_value).then_some((point, value))
            } else {
                // inside contraction, towards the worst vertex
                let point = affine(&centroid, &worst.0, CONTRACT);
                let value = eval(&point);
                (value < worst.1).then_some((point, value))
            };

            match contracted {
                Some(vertex) => simplex[n] = vertex,
                None => {
                    let best = simplex[0].0.clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        let point = affine(&best, &vertex.0, SHRINK);
                        let value = eval(&point);
                        *vertex = (point, value);
                    }
                }
            }
        }

        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        let (point, value) = simplex.swap_remove(0);
        Minimum {
            point,
            value,
            iterations,
            converged,
        }
    }

    fn has_converged(&self, simplex: &[(Vec<f64>, f64)]) -> bool {
        let (best, best_value) = &simplex[0];
        if !best_value.is_finite() {
            return false;
        }
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|(x, _)| x.iter().zip(best).map(|(a, b)| (a - b).abs()))
            .fold(0.0_f64, f64::max);
        let f_spread = simplex[1..]
            .iter()
            .map(|(_, v)| (v - best_value).abs())
            .fold(0.0_f64, f64::max);
        x_spread <= self.xatol && f_spread <= self.fatol
    }
}

fn centroid(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let dim = vertices[0].0.len();
    (0..dim)
        .map(|i| vertices.iter().map(|(x, _)| x[i]).sum::<f64>() / n)
        .collect()
}

/// `origin + t * (target - origin)`
fn affine(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, x)| o + t * (x - o))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_bowl() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let result = NelderMead::default().minimize(f, &[0.0, 0.0]);

        assert!(result.converged);
        assert!((result.point[0] - 3.0).abs() < 1e-3);
        assert!((result.point[1] + 1.0).abs() < 1e-3);
        assert!(result.value < 1e-6);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let solver = NelderMead {
            max_iterations: 10_000,
            ..NelderMead::default()
        };
        let result = solver.minimize(f, &[-1.2, 1.0]);

        assert!(result.converged);
        assert!((result.point[0] - 1.0).abs() < 1e-2);
        assert!((result.point[1] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_infeasible_region_is_avoided() {
        // Minimum of the unconstrained parabola is at 5, but x > 2 is fenced off
        let f = |x: &[f64]| {
            if x[0] > 2.0 {
                f64::NAN
            } else {
                (x[0] - 5.0).powi(2)
            }
        };
        let result = NelderMead::default().minimize(f, &[0.0]);

        assert!(result.point[0] <= 2.0);
        assert!((result.point[0] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_iteration_budget_reports_non_convergence() {
        let f = |x: &[f64]| (x[0] - 100.0).powi(2);
        let solver = NelderMead {
            max_iterations: 3,
            ..NelderMead::default()
        };
        let result = solver.minimize(f, &[0.0]);

        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn test_zero_dimensional() {
        let result = NelderMead::default().minimize(|_| 4.0, &[]);
        assert!(result.converged);
        assert_eq!(result.value, 4.0);
    }
}
