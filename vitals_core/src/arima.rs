//! ARIMA(p, d, q) estimation and forecasting.
//!
//! The series is differenced `d` times. With `d = 0` a mean is estimated
//! alongside the coefficients; with `d >= 1` the differenced series is modelled
//! without a constant. Coefficients are estimated by minimizing the
//! conditional sum of squares (CSS). AR and MA coefficients are searched in an
//! unconstrained space and mapped through the partial-autocorrelation
//! transform, so every candidate model is stationary and invertible.

use crate::optimize::NelderMead;
use std::fmt;

/// Model order: autoregressive degree, differencing degree, moving-average degree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated parameters (the mean counts when `d = 0`)
    pub fn param_count(&self) -> usize {
        self.p + self.q + usize::from(self.d == 0)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Why a model could not be fitted or could not forecast
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("need more than {needed} observations to difference, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("estimation did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },
}

/// Largest magnitude allowed for an unconstrained coefficient.
/// Maps to a partial autocorrelation of about 0.99875.
const MAX_UNCONSTRAINED: f64 = 20.0;

/// A fitted model, ready to forecast
#[derive(Clone, Debug)]
pub struct FittedArima {
    order: ArimaOrder,
    mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    /// Differenced series the coefficients were estimated on
    working: Vec<f64>,
    residuals: Vec<f64>,
    /// Last value of each differencing level, original series first
    levels: Vec<f64>,
}

/// First differences of a series
pub fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Fit an ARIMA model of the given order by conditional sum of squares
pub fn fit(series: &[f64], order: ArimaOrder) -> Result<FittedArima, FitError> {
    fit_with(series, order, &NelderMead::default())
}

/// Fit with explicit optimizer settings
pub fn fit_with(
    series: &[f64],
    order: ArimaOrder,
    solver: &NelderMead,
) -> Result<FittedArima, FitError> {
    if series.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    if series.len() <= order.d {
        return Err(FitError::InsufficientData {
            needed: order.d,
            available: series.len(),
        });
    }

    let mut levels = Vec::with_capacity(order.d);
    let mut working = series.to_vec();
    for _ in 0..order.d {
        if let Some(&last) = working.last() {
            levels.push(last);
        }
        working = difference(&working);
    }

    if working.len() <= order.p + order.param_count() {
        return Ok(FittedArima::unidentified(order, working, levels));
    }

    let layout = ParamLayout::new(order);
    let mut start = vec![0.0; layout.len()];
    if layout.has_mean {
        start[0] = mean(&working);
    }

    let objective = |params: &[f64]| {
        if layout.coefficients(params).iter().any(|x| x.abs() > MAX_UNCONSTRAINED) {
            return f64::INFINITY;
        }
        let (mu, ar, ma) = layout.unpack(params);
        sum_of_squares(&css_residuals(&working, mu, &ar, &ma), order.p)
    };

    let minimum = solver.minimize(objective, &start);
    if !minimum.converged {
        return Err(FitError::NonConvergence {
            iterations: minimum.iterations,
        });
    }
    if !minimum.value.is_finite() {
        return Err(FitError::NonFinite);
    }

    let (mu, ar, ma) = layout.unpack(&minimum.point);
    let residuals = css_residuals(&working, mu, &ar, &ma);
    let effective = (working.len() - order.p) as f64;
    let sigma2 = sum_of_squares(&residuals, order.p) / effective;

    tracing::trace!(
        "ARIMA{} fitted in {} iterations: mean={:.4} ar={:?} ma={:?} sigma2={:.4}",
        order,
        minimum.iterations,
        mu,
        ar,
        ma,
        sigma2
    );

    Ok(FittedArima {
        order,
        mean: mu,
        ar,
        ma,
        sigma2,
        working,
        residuals,
        levels,
    })
}

impl FittedArima {
    /// Model for a series too short to identify its coefficients: the mean
    /// (when `d = 0`) with every AR and MA coefficient at zero
    fn unidentified(order: ArimaOrder, working: Vec<f64>, levels: Vec<f64>) -> Self {
        let mu = if order.d == 0 { mean(&working) } else { 0.0 };
        let residuals = css_residuals(&working, mu, &[], &[]);
        let sigma2 = sum_of_squares(&residuals, 0) / working.len() as f64;

        tracing::trace!(
            "ARIMA{} unidentified on {} observations, using zero coefficients",
            order,
            working.len()
        );

        Self {
            order,
            mean: mu,
            ar: vec![0.0; order.p],
            ma: vec![0.0; order.q],
            sigma2,
            working,
            residuals,
            levels,
        }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Estimated mean of the (undifferenced) series; zero when `d >= 1`
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Point forecast `steps` ahead on the original scale
    ///
    /// Future shocks are taken as zero; forecasts of the differenced series
    /// are integrated back from the last observed level of each difference.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, FitError> {
        let n = self.working.len();
        let mut centered: Vec<f64> = self.working.iter().map(|v| v - self.mean).collect();
        let mut shocks = self.residuals.clone();

        for t in n..n + steps {
            let prediction = one_step(&centered, &shocks, t, &self.ar, &self.ma);
            centered.push(prediction);
            shocks.push(0.0);
        }

        let mut out: Vec<f64> = centered[n..].iter().map(|v| v + self.mean).collect();
        for level in self.levels.iter().rev() {
            let mut acc = *level;
            for v in out.iter_mut() {
                acc += *v;
                *v = acc;
            }
        }

        if out.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }
        Ok(out)
    }
}

/// Position of each parameter group in the optimizer's vector
#[derive(Clone, Copy)]
struct ParamLayout {
    has_mean: bool,
    p: usize,
    q: usize,
}

impl ParamLayout {
    fn new(order: ArimaOrder) -> Self {
        Self {
            has_mean: order.d == 0,
            p: order.p,
            q: order.q,
        }
    }

    fn len(&self) -> usize {
        usize::from(self.has_mean) + self.p + self.q
    }

    fn coefficients<'a>(&self, params: &'a [f64]) -> &'a [f64] {
        &params[usize::from(self.has_mean)..]
    }

    /// Split into (mean, AR coefficients, MA coefficients) on the model scale
    fn unpack(&self, params: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let mu = if self.has_mean { params[0] } else { 0.0 };
        let coefficients = self.coefficients(params);
        let ar = constrain_stationary(&coefficients[..self.p]);
        let ma = constrain_stationary(&coefficients[self.p..self.p + self.q])
            .into_iter()
            .map(|c| -c)
            .collect();
        (mu, ar, ma)
    }
}

/// Map unconstrained values to coefficients of a stationary AR polynomial
/// `1 - a1 z - ... - an z^n`.
///
/// Each value becomes a partial autocorrelation in (-1, 1), then the
/// Durbin–Levinson recursion builds the coefficients.
pub(crate) fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let n = unconstrained.len();
    if n == 0 {
        return Vec::new();
    }
    let partial: Vec<f64> = unconstrained
        .iter()
        .map(|x| x / (1.0 + x * x).sqrt())
        .collect();

    let mut y = vec![vec![0.0; n]; n];
    for k in 0..n {
        for i in 0..k {
            y[k][i] = y[k - 1][i] + partial[k] * y[k - 1][k - i - 1];
        }
        y[k][k] = partial[k];
    }
    y[n - 1].iter().map(|v| -v).collect()
}

/// Prediction for index `t` from values and shocks strictly before it
fn one_step(values: &[f64], shocks: &[f64], t: usize, ar: &[f64], ma: &[f64]) -> f64 {
    let ar_part: f64 = ar
        .iter()
        .enumerate()
        .filter(|(i, _)| t > *i)
        .map(|(i, phi)| phi * values[t - 1 - i])
        .sum();
    let ma_part: f64 = ma
        .iter()
        .enumerate()
        .filter(|(j, _)| t > *j)
        .map(|(j, theta)| theta * shocks[t - 1 - j])
        .sum();
    ar_part + ma_part
}

/// One-step-ahead residuals, conditioning on zero pre-sample shocks.
/// The first `ar.len()` residuals are zero.
fn css_residuals(series: &[f64], mu: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let centered: Vec<f64> = series.iter().map(|v| v - mu).collect();
    let mut shocks = vec![0.0; centered.len()];
    for t in ar.len()..centered.len() {
        shocks[t] = centered[t] - one_step(&centered, &shocks, t, ar, ma);
    }
    shocks
}

fn sum_of_squares(residuals: &[f64], skip: usize) -> f64 {
    residuals.iter().skip(skip).map(|e| e * e).sum()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    /// Stationarity check by the step-down (reverse Durbin–Levinson) recursion
    fn is_stationary(coefficients: &[f64]) -> bool {
        let mut a = coefficients.to_vec();
        while let Some(&r) = a.last() {
            if r.abs() >= 1.0 {
                return false;
            }
            let k = a.len();
            let denom = 1.0 - r * r;
            a = (0..k - 1)
                .map(|j| (a[j] + r * a[k - 2 - j]) / denom)
                .collect();
        }
        true
    }

    fn simulate_ar1(phi: f64, mean: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut x = 0.0;
        (0..n)
            .map(|_| {
                x = phi * x + noise.sample(&mut rng);
                mean + x
            })
            .collect()
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 4.0, 2.0]), vec![3.0, -2.0]);
        assert!(difference(&[1.0]).is_empty());
        assert!(difference(&[]).is_empty());
    }

    #[test]
    fn test_constrained_coefficients_are_stationary() {
        let inputs: [&[f64]; 5] = [
            &[0.3],
            &[-15.0],
            &[2.0, -3.0],
            &[19.0, 19.0],
            &[-0.5, 4.0, 1.5],
        ];
        for input in inputs {
            let coefficients = constrain_stationary(input);
            assert_eq!(coefficients.len(), input.len());
            assert!(is_stationary(&coefficients), "{:?}", coefficients);
        }
        assert!(!is_stationary(&[1.2]));
        assert!(!is_stationary(&[0.6, 0.5]));
    }

    #[test]
    fn test_recovers_ar1_coefficient() {
        let series = simulate_ar1(0.6, 50.0, 400, 11);
        let model = fit(&series, ArimaOrder::new(1, 0, 0)).unwrap();

        assert!((model.ar()[0] - 0.6).abs() < 0.1, "ar = {:?}", model.ar());
        assert!((model.mean() - 50.0).abs() < 0.5, "mean = {}", model.mean());
        assert!((model.sigma2() - 1.0).abs() < 0.25);
    }

    #[test]
    fn test_ar1_forecast_reverts_to_mean() {
        let series = simulate_ar1(0.5, 10.0, 300, 3);
        let model = fit(&series, ArimaOrder::new(1, 0, 0)).unwrap();
        let forecast = model.forecast(40).unwrap();

        assert_eq!(forecast.len(), 40);
        assert!((forecast[39] - model.mean()).abs() < 1e-6);
    }

    #[test]
    fn test_constant_series_forecasts_constant() {
        let series = vec![97.0; 12];
        let model = fit(&series, ArimaOrder::new(1, 0, 1)).unwrap();
        let forecast = model.forecast(5).unwrap();

        for value in forecast {
            assert!((value - 97.0).abs() < 1e-4, "value = {}", value);
        }
    }

    #[test]
    fn test_differenced_forecast_starts_from_last_level() {
        let series = vec![
            120.0, 123.1, 121.4, 125.0, 122.2, 126.3, 124.1, 121.0, 125.5, 123.9, 127.2, 124.4,
        ];
        let model = fit(&series, ArimaOrder::new(1, 1, 1)).unwrap();
        assert_eq!(model.mean(), 0.0);

        let forecast = model.forecast(10).unwrap();
        assert_eq!(forecast.len(), 10);
        assert!((forecast[0] - 124.4).abs() < 15.0);

        // Beyond the MA horizon, forecast increments shrink geometrically
        let steps = difference(&forecast);
        assert!(steps[8].abs() <= steps[0].abs() + 1e-12);
    }

    #[test]
    fn test_insufficient_data() {
        let err = fit(&[], ArimaOrder::new(1, 0, 1)).unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { available: 0, .. }));

        let err = fit(&[4.0], ArimaOrder::new(1, 1, 1)).unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { needed: 1, available: 1 }));
    }

    #[test]
    fn test_short_series_fits_mean_with_zero_coefficients() {
        let model = fit(&[97.0, 97.2, 96.9], ArimaOrder::new(1, 0, 1)).unwrap();
        assert_eq!(model.ar(), &[0.0]);
        assert_eq!(model.ma(), &[0.0]);
        assert!((model.mean() - 97.033_333).abs() < 1e-5);

        let forecast = model.forecast(4).unwrap();
        for value in forecast {
            assert!((value - 97.033_333).abs() < 1e-5);
        }
    }

    #[test]
    fn test_short_differenced_series_holds_last_level() {
        let series = [100.0, 106.0, 98.0, 107.0, 97.0, 108.0, 96.0];
        let model = fit(&series, ArimaOrder::new(2, 1, 2)).unwrap();
        assert_eq!(model.ar(), &[0.0, 0.0]);
        assert_eq!(model.ma(), &[0.0, 0.0]);
        assert_eq!(model.forecast(3).unwrap(), vec![96.0; 3]);
    }

    #[test]
    fn test_non_finite_input() {
        let series = [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(
            fit(&series, ArimaOrder::new(1, 0, 1)).unwrap_err(),
            FitError::NonFinite
        );
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let series = simulate_ar1(0.3, 0.0, 50, 9);
        let solver = NelderMead {
            max_iterations: 2,
            ..NelderMead::default()
        };
        let err = fit_with(&series, ArimaOrder::new(2, 1, 2), &solver).unwrap_err();
        assert_eq!(err, FitError::NonConvergence { iterations: 2 });
    }

    #[test]
    fn test_param_count() {
        assert_eq!(ArimaOrder::new(1, 0, 1).param_count(), 3);
        assert_eq!(ArimaOrder::new(1, 1, 1).param_count(), 2);
        assert_eq!(ArimaOrder::new(2, 1, 2).param_count(), 4);
        assert_eq!(ArimaOrder::new(2, 1, 2).to_string(), "(2,1,2)");
    }
}
