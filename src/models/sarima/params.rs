//! SARIMA parameter value types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::HOURLY_SEASONAL_PERIOD;

/// Non-seasonal order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// AR order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// MA order.
    pub q: usize,
}

impl Order {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonalOrder {
    /// Seasonal AR order.
    pub p: usize,
    /// Seasonal differencing order.
    pub d: usize,
    /// Seasonal MA order.
    pub q: usize,
    /// Seasonal period.
    pub s: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, s: usize) -> Self {
        Self { p, d, q, s }
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.s)
    }
}

/// Full SARIMA specification `(p,d,q)x(P,D,Q,s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarimaParams {
    pub order: Order,
    pub seasonal_order: SeasonalOrder,
}

impl SarimaParams {
    pub fn new(order: Order, seasonal_order: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal_order,
        }
    }

    /// The parameterization used when the grid search is disabled or
    /// produces no usable model: `(1,1,2)x(1,1,2,24)`.
    pub fn fallback() -> Self {
        Self::new(
            Order::new(1, 1, 2),
            SeasonalOrder::new(1, 1, 2, HOURLY_SEASONAL_PERIOD),
        )
    }

    /// Number of estimated coefficients (AR + MA + seasonal AR + seasonal MA).
    pub fn num_coefficients(&self) -> usize {
        self.order.p + self.order.q + self.seasonal_order.p + self.seasonal_order.q
    }

    /// Parameters counted by the information criteria (coefficients plus
    /// the innovation variance).
    pub fn num_params(&self) -> usize {
        self.num_coefficients() + 1
    }

    /// Observations needed before every lag of the model is backed by data:
    /// `max(p, q) + s * max(P, Q) + 1`.
    pub fn min_observations(&self) -> usize {
        let s = &self.seasonal_order;
        self.order.p.max(self.order.q) + s.s * s.p.max(s.q) + 1
    }
}

impl Default for SarimaParams {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for SarimaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.order, self.seasonal_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_params() {
        let params = SarimaParams::fallback();
        assert_eq!(params.order, Order::new(1, 1, 2));
        assert_eq!(params.seasonal_order, SeasonalOrder::new(1, 1, 2, 24));
        assert_eq!(params, SarimaParams::default());
    }

    #[test]
    fn params_display() {
        assert_eq!(SarimaParams::fallback().to_string(), "(1,1,2)x(1,1,2,24)");
    }

    #[test]
    fn params_counts() {
        let params = SarimaParams::fallback();
        assert_eq!(params.num_coefficients(), 6);
        assert_eq!(params.num_params(), 7);
        assert_eq!(params.min_observations(), 2 + 24 * 2 + 1);
    }

    #[test]
    fn params_serialize_with_named_fields() {
        let json = serde_json::to_value(SarimaParams::fallback()).unwrap();
        assert_eq!(json["order"]["q"], 2);
        assert_eq!(json["seasonal_order"]["s"], 24);
    }
}
