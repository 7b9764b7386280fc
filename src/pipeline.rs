//! End-to-end forecast runs.
//!
//! The SARIMA path selects an order on the differenced series (or uses the
//! fallback), refits it, forecasts increments and reconstructs cumulative
//! totals. The Holt-Winters path forecasts the absolute series directly.

use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::core::{prepare, Datapoint, Headline, HwPrediction, PreparedSeries};
use crate::error::{ForecastError, Result};
use crate::models::holt_winters::{HWParams, HWState, HoltWintersEngine};
use crate::models::sarima::{GridResult, GridSearch, SarimaParams, SARIMA};
use crate::reconstruct::{reconstruct, CumulativeForecast};

/// Which engine a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    Sarima,
    HoltWinters,
}

/// Output of the SARIMA path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaReport {
    /// Parameters of the model that produced the forecast.
    pub params: SarimaParams,
    /// AIC of the final refit.
    pub aic: f64,
    /// Every successful grid candidate, when the search ran and found one.
    pub grid: Option<GridResult>,
    /// Whether the fallback parameterization was used.
    pub used_fallback: bool,
    pub forecast: CumulativeForecast,
}

impl SarimaReport {
    /// Final cumulative totals.
    pub fn headline(&self) -> Option<Headline> {
        self.forecast.headline()
    }
}

/// Output of the Holt-Winters path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoltWintersReport {
    pub params: HWParams,
    /// Terminal state after absorbing every observation.
    pub state: HWState,
    pub predictions: Vec<HwPrediction>,
}

/// Output of [`run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Report {
    Sarima(SarimaReport),
    HoltWinters(HoltWintersReport),
}

/// Select, fit and forecast a SARIMA model on the differenced series.
pub fn run_sarima(prepared: &PreparedSeries, config: &ForecastConfig) -> Result<SarimaReport> {
    config.validate()?;
    let values = prepared.differenced.values();
    let last_observed = prepared
        .last_value()
        .ok_or(ForecastError::InsufficientData { needed: 2, got: 0 })?;

    let (params, grid) = match config.grid_spec() {
        Some(spec) => {
            let mut search = GridSearch::new(spec);
            if let Some(limit) = config.grid_time_limit {
                search = search.with_time_limit(limit);
            }
            match search.run(values) {
                Ok(result) => match result.best() {
                    Some(best) => (best.params, Some(result)),
                    None => (SarimaParams::fallback(), None),
                },
                Err(ForecastError::EmptySearchSpace { attempted }) => {
                    log::warn!(
                        "no grid candidate fitted out of {attempted}; using SARIMA{}",
                        SarimaParams::fallback()
                    );
                    (SarimaParams::fallback(), None)
                }
                Err(err) => return Err(err),
            }
        }
        None => {
            log::info!("grid search disabled; using SARIMA{}", SarimaParams::fallback());
            (SarimaParams::fallback(), None)
        }
    };
    let used_fallback = grid.is_none();

    let mut model = SARIMA::new(params);
    if let Err(err) = model.fit(values) {
        log::error!("final SARIMA{params} fit failed: {err}");
        return Err(err);
    }
    let aic = model.aic().ok_or(ForecastError::FitRequired)?;

    let steps = config.forecast_steps();
    let intervals = model.forecast(steps, config.confidence_level)?;
    let forecast = reconstruct(&intervals, last_observed);

    if let Some(headline) = forecast.headline() {
        log::info!(
            "SARIMA{params} forecast {steps} steps: total {:.2} [{:.2}, {:.2}]",
            headline.mean_total,
            headline.lower_total,
            headline.upper_total
        );
    }

    Ok(SarimaReport {
        params,
        aic,
        grid,
        used_fallback,
        forecast,
    })
}

/// Fit Holt-Winters on the absolute series and forecast it.
pub fn run_holt_winters(
    prepared: &PreparedSeries,
    config: &ForecastConfig,
) -> Result<HoltWintersReport> {
    config.validate()?;
    let observed = &prepared.observed;

    let mut engine = HoltWintersEngine::new();
    let predictions =
        engine.get_forecast(observed.values(), observed.timestamps(), config.forecast_steps())?;
    let params = engine.params().ok_or(ForecastError::FitRequired)?;
    let state = engine.state().cloned().ok_or(ForecastError::FitRequired)?;

    log::info!(
        "Holt-Winters forecast {} steps (period {})",
        predictions.len(),
        state.period()
    );

    Ok(HoltWintersReport {
        params,
        state,
        predictions,
    })
}

/// Validate, prepare and forecast raw datapoints with the chosen engine.
pub fn run(strategy: Strategy, datapoints: &[Datapoint], config: &ForecastConfig) -> Result<Report> {
    config.validate()?;
    let prepared = prepare(datapoints)?;
    match strategy {
        Strategy::Sarima => run_sarima(&prepared, config).map(Report::Sarima),
        Strategy::HoltWinters => run_holt_winters(&prepared, config).map(Report::HoltWinters),
    }
}
