//! Frozen-at-startup tool contracts: [`ToolSchema`] and cost estimation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Market,
    Backtest,
    Memory,
    Meeting,
    Intelligence,
    Trading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostUnit {
    Rows,
    Indicators,
    Params,
    Nil,
}

/// A tool contract, declared once per tool name and frozen for the lifetime
/// of the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    pub parameters: Value,
    pub base_cost: f64,
    pub cost_per_unit: f64,
    pub cost_unit: CostUnit,
    pub requires_approval_above: Option<f64>,
    pub allowed_departments: Option<Vec<String>>,
}

impl ToolSchema {
    /// `baseCost + ceil(args[costUnit] * costPerUnit)`. Unitless tools
    /// (`CostUnit::Nil`) always cost exactly `base_cost`.
    pub fn estimate_cost(&self, args: &Value) -> f64 {
        let unit_key = match self.cost_unit {
            CostUnit::Rows => "rows",
            CostUnit::Indicators => "indicators",
            CostUnit::Params => "params",
            CostUnit::Nil => return self.base_cost,
        };
        let units = args.get(unit_key).and_then(Value::as_f64).unwrap_or(0.0);
        self.base_cost + (units * self.cost_per_unit).ceil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ToolSchema {
        ToolSchema {
            name: "market.history".into(),
            description: "fetch OHLCV history".into(),
            category: ToolCategory::Market,
            parameters: json!({}),
            base_cost: 1.0,
            cost_per_unit: 0.1,
            cost_unit: CostUnit::Rows,
            requires_approval_above: Some(50.0),
            allowed_departments: None,
        }
    }

    #[test]
    fn estimate_cost_includes_unit_charge() {
        let s = schema();
        assert_eq!(s.estimate_cost(&json!({"rows": 30})), 1.0 + 3.0);
    }

    #[test]
    fn estimate_cost_ceils_partial_units() {
        let s = schema();
        assert_eq!(s.estimate_cost(&json!({"rows": 21})), 1.0 + 3.0);
    }

    #[test]
    fn nil_cost_unit_ignores_args() {
        let mut s = schema();
        s.cost_unit = CostUnit::Nil;
        assert_eq!(s.estimate_cost(&json!({"rows": 9999})), 1.0);
    }
}
