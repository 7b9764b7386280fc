//! Seasonal ARIMA fitted by conditional sum of squares.

use crate::core::{Forecast, ForecastInterval};
use crate::error::{ForecastError, Result};
use crate::models::sarima::params::SarimaParams;
use crate::models::sarima::polynomial::{psi_weights, LagPolynomial};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::two_sided_z;

/// Fewest values a fit accepts.
pub const MIN_FIT_VALUES: usize = 3;

/// Default interval confidence level.
pub const DEFAULT_LEVEL: f64 = 0.95;

/// Estimated SARIMA coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SarimaCoefficients {
    /// Non-seasonal AR coefficients φ.
    pub ar: Vec<f64>,
    /// Non-seasonal MA coefficients θ.
    pub ma: Vec<f64>,
    /// Seasonal AR coefficients Φ.
    pub seasonal_ar: Vec<f64>,
    /// Seasonal MA coefficients Θ.
    pub seasonal_ma: Vec<f64>,
}

impl SarimaCoefficients {
    /// Split a flat parameter vector laid out as `[φ.., θ.., Φ.., Θ..]`.
    fn unpack(params: &SarimaParams, flat: &[f64]) -> Self {
        let (p, q) = (params.order.p, params.order.q);
        let (sp, sq) = (params.seasonal_order.p, params.seasonal_order.q);
        Self {
            ar: flat[..p].to_vec(),
            ma: flat[p..p + q].to_vec(),
            seasonal_ar: flat[p + q..p + q + sp].to_vec(),
            seasonal_ma: flat[p + q + sp..p + q + sp + sq].to_vec(),
        }
    }

    /// Expand into the full AR side (differencing included) and MA side.
    fn expand(&self, params: &SarimaParams) -> (LagPolynomial, LagPolynomial) {
        let s = params.seasonal_order.s;
        let ar = LagPolynomial::from_factor(&self.ar, 1, -1.0)
            .multiply(&LagPolynomial::from_factor(&self.seasonal_ar, s, -1.0))
            .multiply(&LagPolynomial::difference(params.order.d, 1))
            .multiply(&LagPolynomial::difference(params.seasonal_order.d, s));
        let ma = LagPolynomial::from_factor(&self.ma, 1, 1.0)
            .multiply(&LagPolynomial::from_factor(&self.seasonal_ma, s, 1.0));
        (ar, ma)
    }
}

/// One-step recursion over `values`.
///
/// Pre-sample values are the first observation and pre-sample innovations
/// are zero. Returns the one-step predictions and innovations.
fn filter(values: &[f64], ar: &[(usize, f64)], ma: &[(usize, f64)]) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let first = values[0];
    let mut fitted = Vec::with_capacity(n);
    let mut innovations = Vec::with_capacity(n);

    for t in 0..n {
        let mut pred = 0.0;
        for &(lag, a) in ar {
            let past = if t >= lag { values[t - lag] } else { first };
            pred -= a * past;
        }
        for &(lag, m) in ma {
            if t >= lag {
                pred += m * innovations[t - lag];
            }
        }
        fitted.push(pred);
        innovations.push(values[t] - pred);
    }

    (fitted, innovations)
}

/// Conditional sum of squares over every step after the first.
fn conditional_sum_of_squares(values: &[f64], ar: &[(usize, f64)], ma: &[(usize, f64)]) -> f64 {
    let (_, innovations) = filter(values, ar, ma);
    innovations[1..].iter().map(|e| e * e).sum()
}

/// Seasonal ARIMA forecaster.
///
/// `φ(B)Φ(B^s)(1-B)^d(1-B^s)^D y_t = θ(B)Θ(B^s) ε_t`, without a constant.
///
/// # Example
/// ```
/// use spend_forecast::models::sarima::{Order, SarimaParams, SeasonalOrder, SARIMA};
///
/// let values: Vec<f64> = (0..72)
///     .map(|i| 10.0 + (i % 24) as f64 + 0.1 * i as f64)
///     .collect();
/// let params = SarimaParams::new(Order::new(1, 1, 1), SeasonalOrder::new(0, 1, 1, 24));
///
/// let mut model = SARIMA::new(params);
/// model.fit(&values).unwrap();
///
/// let rows = model.forecast(24, 0.95).unwrap();
/// assert_eq!(rows.len(), 24);
/// assert!(rows.iter().all(|r| r.lower <= r.mean && r.mean <= r.upper));
/// ```
#[derive(Debug, Clone)]
pub struct SARIMA {
    params: SarimaParams,
    coefficients: SarimaCoefficients,
    ar_poly: Option<LagPolynomial>,
    ma_poly: Option<LagPolynomial>,
    values: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
}

impl SARIMA {
    /// Create an unfitted model.
    pub fn new(params: SarimaParams) -> Self {
        Self {
            params,
            coefficients: SarimaCoefficients::default(),
            ar_poly: None,
            ma_poly: None,
            values: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            log_likelihood: None,
            aic: None,
            bic: None,
        }
    }

    /// Model with the fallback parameterization `(1,1,2)x(1,1,2,24)`.
    pub fn fallback() -> Self {
        Self::new(SarimaParams::fallback())
    }

    pub fn params(&self) -> SarimaParams {
        self.params
    }

    pub fn coefficients(&self) -> &SarimaCoefficients {
        &self.coefficients
    }

    /// Innovation variance `CSS / n_eff`.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Estimate coefficients on `values`.
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.len() < MIN_FIT_VALUES {
            return Err(ForecastError::InsufficientData {
                needed: MIN_FIT_VALUES,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let min_obs = self.params.min_observations();
        if values.len() < min_obs {
            log::debug!(
                "SARIMA{} fitted on {} values, fewer than the {} its lags span",
                self.params,
                values.len(),
                min_obs
            );
        }

        let coefficients = self.estimate_coefficients(values);
        let (ar_poly, ma_poly) = coefficients.expand(&self.params);
        let (fitted, residuals) = filter(values, &ar_poly.sparse_tail(), &ma_poly.sparse_tail());

        let n_eff = (values.len() - 1) as f64;
        let css: f64 = residuals[1..].iter().map(|e| e * e).sum();
        if !css.is_finite() {
            return Err(ForecastError::divergence(
                format!("SARIMA{} fit", self.params),
                format!("conditional sum of squares is {css}"),
            ));
        }

        // A perfect in-sample fit would send the log-likelihood to +inf.
        let scale = values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64;
        let sigma2 = (css / n_eff).max(1e-12 * scale.max(1.0));
        let k = self.params.num_params() as f64;
        let log_likelihood =
            -0.5 * n_eff * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n_eff.ln();

        if !aic.is_finite() {
            return Err(ForecastError::divergence(
                format!("SARIMA{} fit", self.params),
                format!("AIC is {aic} (sigma2 = {sigma2})"),
            ));
        }

        log::debug!(
            "SARIMA{} fitted: sigma2={:.6}, aic={:.4}",
            self.params,
            sigma2,
            aic
        );

        self.coefficients = coefficients;
        self.ar_poly = Some(ar_poly);
        self.ma_poly = Some(ma_poly);
        self.values = Some(values.to_vec());
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.sigma2 = Some(sigma2);
        self.log_likelihood = Some(log_likelihood);
        self.aic = Some(aic);
        self.bic = Some(bic);
        Ok(())
    }

    fn estimate_coefficients(&self, values: &[f64]) -> SarimaCoefficients {
        let params = self.params;
        let n_coef = params.num_coefficients();
        if n_coef == 0 {
            return SarimaCoefficients::default();
        }

        let mut initial = Vec::with_capacity(n_coef);
        for len in [
            params.order.p,
            params.order.q,
            params.seasonal_order.p,
            params.seasonal_order.q,
        ] {
            initial.extend((0..len).map(|i| 0.1 / (i + 1) as f64));
        }
        // Stationarity and invertibility are not enforced.
        let config = NelderMeadConfig {
            max_iter: (200 * n_coef).max(1000),
            ..Default::default()
        };

        let result = nelder_mead(
            |flat| {
                let (ar, ma) = SarimaCoefficients::unpack(&params, flat).expand(&params);
                conditional_sum_of_squares(values, &ar.sparse_tail(), &ma.sparse_tail())
            },
            &initial,
            None,
            config,
        );

        if !result.converged {
            log::debug!(
                "SARIMA{} optimizer stopped after {} iterations without converging",
                params,
                result.iterations
            );
        }

        SarimaCoefficients::unpack(&params, &result.optimal_point)
    }

    /// Point forecasts for `steps` steps with future innovations set to zero.
    fn point_forecast(&self, steps: usize) -> Result<Vec<f64>> {
        let values = self.values.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;
        let ar_poly = self.ar_poly.as_ref().ok_or(ForecastError::FitRequired)?;
        let ma_poly = self.ma_poly.as_ref().ok_or(ForecastError::FitRequired)?;
        let ar = ar_poly.sparse_tail();
        let ma = ma_poly.sparse_tail();

        let n = values.len();
        let first = values[0];
        let mut extended = values.clone();
        extended.reserve(steps);

        for t in n..n + steps {
            let mut pred = 0.0;
            for &(lag, a) in &ar {
                let past = if t >= lag { extended[t - lag] } else { first };
                pred -= a * past;
            }
            for &(lag, m) in &ma {
                if t >= lag && t - lag < n {
                    pred += m * residuals[t - lag];
                }
            }
            extended.push(pred);
        }

        Ok(extended.split_off(n))
    }

    /// Forecast `steps` steps ahead with `level` prediction intervals.
    ///
    /// The half-width at step `h` is `z * sqrt(sigma2 * Σ_{j<h} ψ_j²)`.
    pub fn forecast(&self, steps: usize, level: f64) -> Result<Vec<ForecastInterval>> {
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;
        let ar_poly = self.ar_poly.as_ref().ok_or(ForecastError::FitRequired)?;
        let ma_poly = self.ma_poly.as_ref().ok_or(ForecastError::FitRequired)?;

        let means = self.point_forecast(steps)?;
        let psi = psi_weights(ar_poly, ma_poly, steps);
        let z = two_sided_z(level);

        let mut cumulative_psi2 = 0.0;
        let mut rows = Vec::with_capacity(steps);
        for (h, (mean, weight)) in means.into_iter().zip(psi).enumerate() {
            cumulative_psi2 += weight * weight;
            let half_width = z * (sigma2 * cumulative_psi2).sqrt();
            let row = ForecastInterval {
                step: h + 1,
                lower: mean - half_width,
                mean,
                upper: mean + half_width,
            };
            if !(row.lower.is_finite() && row.mean.is_finite() && row.upper.is_finite()) {
                return Err(ForecastError::divergence(
                    format!("SARIMA{} forecast", self.params),
                    format!("non-finite forecast at step {}", row.step),
                ));
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::fallback()
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        SARIMA::fit(self, values)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        Ok(Forecast::from_values(self.point_forecast(horizon)?))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let rows = self.forecast(horizon, level)?;
        Ok(Forecast::from_values_with_intervals(
            rows.iter().map(|r| r.mean).collect(),
            rows.iter().map(|r| r.lower).collect(),
            rows.iter().map(|r| r.upper).collect(),
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sarima::params::{Order, SeasonalOrder};
    use approx::assert_relative_eq;
    use rand::distributions::Distribution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::Normal;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0;
                20.0 + 0.05 * i as f64 + 4.0 * phase.sin() + 0.3 * (i as f64 * 0.7).cos()
            })
            .collect()
    }

    #[test]
    fn sarima_rejects_short_input() {
        let mut model = SARIMA::fallback();
        let err = model.fit(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 3, got: 2 });
        assert!(!model.is_fitted());
    }

    #[test]
    fn sarima_rejects_non_finite_values() {
        let mut model = SARIMA::fallback();
        assert_eq!(
            model.fit(&[1.0, f64::NAN, 3.0, 4.0]).unwrap_err(),
            ForecastError::MissingValues
        );
    }

    #[test]
    fn sarima_requires_fit_before_forecast() {
        let model = SARIMA::fallback();
        assert_eq!(model.forecast(3, 0.95).unwrap_err(), ForecastError::FitRequired);
        assert!(model.predict(3).is_err());
    }

    #[test]
    fn sarima_fits_short_series_with_fallback() {
        let mut model = SARIMA::fallback();
        model.fit(&[5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();

        let rows = model.forecast(24, DEFAULT_LEVEL).unwrap();
        assert_eq!(rows.len(), 24);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.step, i + 1);
            assert!(row.is_ordered());
        }
        assert!(model.aic().unwrap().is_finite());
    }

    #[test]
    fn sarima_coefficients_match_orders() {
        let mut model = SARIMA::fallback();
        model.fit(&seasonal_series(96)).unwrap();

        let c = model.coefficients();
        assert_eq!(c.ar.len(), 1);
        assert_eq!(c.ma.len(), 2);
        assert_eq!(c.seasonal_ar.len(), 1);
        assert_eq!(c.seasonal_ma.len(), 2);
        for v in c.ar.iter().chain(&c.ma).chain(&c.seasonal_ar).chain(&c.seasonal_ma) {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn sarima_recovers_ma_coefficient_above_one() {
        // y_t = e_t + 1.5 e_{t-1} + 0.6 e_{t-2} is invertible but has |θ1| > 1.
        let mut rng = StdRng::seed_from_u64(2024);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let e: Vec<f64> = (0..2002).map(|_| noise.sample(&mut rng)).collect();
        let values: Vec<f64> = (2..e.len())
            .map(|t| e[t] + 1.5 * e[t - 1] + 0.6 * e[t - 2])
            .collect();

        let params = SarimaParams::new(Order::new(0, 0, 2), SeasonalOrder::new(0, 0, 0, 24));
        let mut model = SARIMA::new(params);
        model.fit(&values).unwrap();

        let ma = &model.coefficients().ma;
        assert!(ma[0] > 1.0, "theta1 = {}", ma[0]);
        assert_relative_eq!(ma[0], 1.5, epsilon = 0.1);
        assert_relative_eq!(ma[1], 0.6, epsilon = 0.1);
        assert_relative_eq!(model.sigma2().unwrap(), 1.0, epsilon = 0.15);
    }

    #[test]
    fn sarima_aic_formula() {
        let values = seasonal_series(72);
        let params = SarimaParams::new(Order::new(1, 1, 0), SeasonalOrder::new(0, 1, 1, 24));
        let mut model = SARIMA::new(params);
        model.fit(&values).unwrap();

        let n_eff = (values.len() - 1) as f64;
        let sigma2 = model.sigma2().unwrap();
        let ll = -0.5 * n_eff * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);
        assert_relative_eq!(model.log_likelihood().unwrap(), ll, epsilon = 1e-9);
        assert_relative_eq!(model.aic().unwrap(), -2.0 * ll + 2.0 * 3.0, epsilon = 1e-9);
    }

    #[test]
    fn sarima_is_deterministic() {
        let values = seasonal_series(72);
        let mut a = SARIMA::fallback();
        let mut b = SARIMA::fallback();
        a.fit(&values).unwrap();
        b.fit(&values).unwrap();

        assert_eq!(a.aic(), b.aic());
        assert_eq!(a.forecast(12, 0.95).unwrap(), b.forecast(12, 0.95).unwrap());
    }

    #[test]
    fn sarima_intervals_widen_with_horizon() {
        let mut model = SARIMA::fallback();
        model.fit(&seasonal_series(96)).unwrap();

        let rows = model.forecast(48, 0.95).unwrap();
        let width = |r: &ForecastInterval| r.upper - r.lower;
        for pair in rows.windows(2) {
            assert!(width(&pair[1]) >= width(&pair[0]) - 1e-9);
        }
    }

    #[test]
    fn sarima_wider_level_gives_wider_interval() {
        let mut model = SARIMA::fallback();
        model.fit(&seasonal_series(72)).unwrap();

        let narrow = model.forecast(6, 0.8).unwrap();
        let wide = model.forecast(6, 0.99).unwrap();
        for (n, w) in narrow.iter().zip(&wide) {
            assert_relative_eq!(n.mean, w.mean);
            assert!(w.upper - w.lower > n.upper - n.lower);
        }
    }

    #[test]
    fn random_walk_forecast_is_flat() {
        // (0,1,0) with no coefficients: the forecast repeats the last value.
        let params = SarimaParams::new(Order::new(0, 1, 0), SeasonalOrder::new(0, 0, 0, 24));
        let mut model = SARIMA::new(params);
        model.fit(&[3.0, 4.0, 2.0, 6.0]).unwrap();

        let rows = model.forecast(3, 0.95).unwrap();
        for row in &rows {
            assert_relative_eq!(row.mean, 6.0);
        }
        // Width grows like sqrt(h).
        let w1 = rows[0].upper - rows[0].lower;
        let w3 = rows[2].upper - rows[2].lower;
        assert_relative_eq!(w3 / w1, 3f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn forecaster_trait_matches_forecast_rows() {
        let mut model = SARIMA::fallback();
        Forecaster::fit(&mut model, &seasonal_series(60)).unwrap();

        let forecast = model.predict_with_intervals(5, 0.95).unwrap();
        let rows = model.forecast(5, 0.95).unwrap();
        assert_eq!(forecast.intervals().unwrap(), rows);
        assert_eq!(model.name(), "SARIMA");
        assert_eq!(model.residuals().unwrap().len(), 60);
    }
}
