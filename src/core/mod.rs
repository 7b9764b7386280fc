//! Core data structures for spend forecasting.

mod forecast;
mod series;

pub use forecast::{CumulativeInterval, Forecast, ForecastInterval, Headline, HwPrediction};
pub use series::{
    prepare, Datapoint, DifferencedSeries, Observation, ObservedSeries, PreparedSeries,
};
