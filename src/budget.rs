//! Budget comparison of a forecast headline.
//!
//! Decides whether a run should forecast at all on a given day, whether the
//! projected month-end spend breaches the current limit, and what alert a
//! notifier would send. Nothing here reads the wall clock or sends anything.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::core::Headline;
use crate::error::{ForecastError, Result};

/// Recommended limits are rounded up to the next multiple of this.
pub const LIMIT_ROUNDING: f64 = 1000.0;

/// Guard against forecasting too early or too late in the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    /// Forecast horizon in days.
    pub forecast_length_days: usize,
}

impl ForecastWindow {
    pub fn new(forecast_length_days: usize) -> Self {
        Self {
            forecast_length_days,
        }
    }

    /// Window for the horizon of `config`.
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.forecast_length_days)
    }

    /// Whether a run at `now` has enough history behind it and enough of
    /// the month ahead of it.
    pub fn allows(&self, now: DateTime<Utc>) -> Result<bool> {
        let day = now.day() as usize;
        if day < self.forecast_length_days {
            return Ok(false);
        }
        let last_day = last_day_of_month(now.year(), now.month())? as usize;
        Ok(day < last_day.saturating_sub(self.forecast_length_days))
    }
}

/// Number of days in the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Result<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .ok_or_else(|| ForecastError::ComputationError(format!("invalid month {year}-{month}")))
}

/// Outcome of comparing a projection with the current limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetVerdict {
    pub breached: bool,
    /// Projected total at the end of the horizon.
    pub mean_total: f64,
    /// Current spend limit.
    pub budget: f64,
    /// Projection rounded up to the next thousand.
    pub recommended_limit: f64,
    /// Spend so far (last observed absolute value).
    pub current_spend: f64,
}

/// Compares forecast headlines with a spend limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetCheck;

impl BudgetCheck {
    /// Breach iff the projected mean total exceeds `budget`.
    pub fn evaluate(headline: &Headline, budget: f64, current_spend: f64) -> BudgetVerdict {
        let mean_total = headline.mean_total;
        let verdict = BudgetVerdict {
            breached: mean_total > budget,
            mean_total,
            budget,
            recommended_limit: recommended_limit(mean_total),
            current_spend,
        };
        if verdict.breached {
            log::warn!(
                "projected spend {:.2} exceeds budget {:.2}; recommending {:.0}",
                mean_total,
                budget,
                verdict.recommended_limit
            );
        } else {
            log::info!("projected spend {mean_total:.2} within budget {budget:.2}");
        }
        verdict
    }
}

/// `total + 1000 - (total mod 1000)`.
pub fn recommended_limit(total: f64) -> f64 {
    total + LIMIT_ROUNDING - total.rem_euclid(LIMIT_ROUNDING)
}

/// Message a notifier sends when the budget is projected to be exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub environment: String,
    pub region: String,
    pub forecast_length_days: usize,
    pub projected_spend: f64,
    pub current_limit: f64,
    pub recommended_limit: f64,
    pub spend_to_date: f64,
}

impl AlertPayload {
    /// Alert for a breached verdict; `None` when within budget.
    pub fn from_verdict(
        verdict: &BudgetVerdict,
        environment: impl Into<String>,
        region: impl Into<String>,
        forecast_length_days: usize,
    ) -> Option<Self> {
        verdict.breached.then(|| Self {
            environment: environment.into(),
            region: region.into(),
            forecast_length_days,
            projected_spend: verdict.mean_total,
            current_limit: verdict.budget,
            recommended_limit: verdict.recommended_limit,
            spend_to_date: verdict.current_spend,
        })
    }

    pub fn subject(&self) -> String {
        "Spend budget forecast".to_string()
    }

    /// Plain-text body.
    pub fn body(&self) -> String {
        format!(
            "Spend in {env}/{region} is expected to exceed budget within {days} days.\n\n\
             Forecasted total spend in {days} days: {projected:.2}\n\n\
             Current spend: {spend:.2}\n\
             Current budget: {limit:.2}\n\
             Recommended budget: {recommended:.0}\n",
            env = self.environment,
            region = self.region,
            days = self.forecast_length_days,
            projected = self.projected_spend,
            spend = self.spend_to_date,
            limit = self.current_limit,
            recommended = self.recommended_limit,
        )
    }
}
