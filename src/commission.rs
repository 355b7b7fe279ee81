//! Commission terms and payout calculation.
//!
//! Money is integer minor units everywhere. The only floating point in
//! the module is the percentage rate itself.

use serde::{Deserialize, Serialize};

use crate::errors::{ReftrackerError, Result};

/// Commission terms of an agent. Exactly one variant per agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CommissionPlan {
    /// Flat payout per conversion, independent of the deal value.
    Fixed { amount: i64 },
    /// Percentage of the conversion's estimated value.
    Percentage { rate: f64 },
}

impl CommissionPlan {
    /// Column value stored in `agents.commission_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            CommissionPlan::Fixed { .. } => "fixed",
            CommissionPlan::Percentage { .. } => "percentage",
        }
    }

    /// Rejects plans that could never produce a sane payout.
    pub fn validate(&self) -> Result<()> {
        match self {
            CommissionPlan::Fixed { amount } => {
                if *amount < 0 {
                    return Err(ReftrackerError::invalid_argument(format!(
                        "fixed commission amount must be >= 0, got {}",
                        amount
                    )));
                }
            }
            CommissionPlan::Percentage { rate } => {
                if !rate.is_finite() || *rate < 0.0 || *rate > 100.0 {
                    return Err(ReftrackerError::invalid_argument(format!(
                        "commission rate must be within 0..=100, got {}",
                        rate
                    )));
                }
            }
        }
        Ok(())
    }

    /// Splits the plan into the three agent table columns.
    pub fn to_columns(&self) -> (&'static str, Option<i64>, Option<f64>) {
        match self {
            CommissionPlan::Fixed { amount } => ("fixed", Some(*amount), None),
            CommissionPlan::Percentage { rate } => ("percentage", None, Some(*rate)),
        }
    }

    /// Rebuilds the plan from the agent table columns.
    pub fn from_columns(
        commission_type: &str,
        amount: Option<i64>,
        rate: Option<f64>,
    ) -> Result<Self> {
        match commission_type {
            "fixed" => Ok(CommissionPlan::Fixed {
                amount: amount.unwrap_or(0),
            }),
            "percentage" => Ok(CommissionPlan::Percentage {
                rate: rate.unwrap_or(0.0),
            }),
            other => Err(ReftrackerError::database_operation(format!(
                "unknown commission type in storage: {}",
                other
            ))),
        }
    }
}

/// Computes the commission for one conversion.
///
/// A negative estimated value is an input error and is rejected, never
/// clamped. Zero is a legitimate value (unknown deal size) and pays the
/// fixed amount or nothing under a percentage plan.
pub fn compute(plan: &CommissionPlan, estimated_value: i64) -> Result<i64> {
    if estimated_value < 0 {
        return Err(ReftrackerError::invalid_argument(format!(
            "estimated value must be >= 0, got {}",
            estimated_value
        )));
    }

    match plan {
        CommissionPlan::Fixed { amount } => Ok(*amount),
        CommissionPlan::Percentage { rate } => {
            // f64::round is half away from zero, which on this
            // non-negative domain is exactly half-up.
            let commission = (estimated_value as f64 * rate / 100.0).round();
            Ok(commission as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_ignores_value() {
        let plan = CommissionPlan::Fixed { amount: 10000 };
        assert_eq!(compute(&plan, 5_600_000).unwrap(), 10000);
        assert_eq!(compute(&plan, 0).unwrap(), 10000);
        assert_eq!(compute(&plan, 1).unwrap(), 10000);
    }

    #[test]
    fn test_percentage() {
        let plan = CommissionPlan::Percentage { rate: 12.0 };
        assert_eq!(compute(&plan, 4_500_000).unwrap(), 540_000);
        assert_eq!(compute(&plan, 0).unwrap(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 2 * 25% = 0.5 -> 1
        let plan = CommissionPlan::Percentage { rate: 25.0 };
        assert_eq!(compute(&plan, 2).unwrap(), 1);
        // 3 * 50% = 1.5 -> 2
        let plan = CommissionPlan::Percentage { rate: 50.0 };
        assert_eq!(compute(&plan, 3).unwrap(), 2);
        // 1 * 30% = 0.3 -> 0
        let plan = CommissionPlan::Percentage { rate: 30.0 };
        assert_eq!(compute(&plan, 1).unwrap(), 0);
    }

    #[test]
    fn test_negative_value_rejected() {
        let fixed = CommissionPlan::Fixed { amount: 10000 };
        let pct = CommissionPlan::Percentage { rate: 12.0 };
        assert!(matches!(
            compute(&fixed, -1),
            Err(ReftrackerError::InvalidArgument(_))
        ));
        assert!(matches!(
            compute(&pct, -1),
            Err(ReftrackerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_plan_validation() {
        assert!(CommissionPlan::Fixed { amount: 0 }.validate().is_ok());
        assert!(CommissionPlan::Fixed { amount: -5 }.validate().is_err());
        assert!(CommissionPlan::Percentage { rate: 0.0 }.validate().is_ok());
        assert!(CommissionPlan::Percentage { rate: 100.0 }.validate().is_ok());
        assert!(CommissionPlan::Percentage { rate: 100.1 }.validate().is_err());
        assert!(CommissionPlan::Percentage { rate: -0.1 }.validate().is_err());
        assert!(
            CommissionPlan::Percentage { rate: f64::NAN }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_column_round_trip() {
        let plan = CommissionPlan::Percentage { rate: 12.5 };
        let (kind, amount, rate) = plan.to_columns();
        assert_eq!(kind, "percentage");
        assert_eq!(amount, None);
        let rebuilt = CommissionPlan::from_columns(kind, amount, rate).unwrap();
        assert_eq!(rebuilt, plan);

        assert!(CommissionPlan::from_columns("tiered", None, None).is_err());
    }

    #[test]
    fn test_wire_representation() {
        let plan: CommissionPlan =
            serde_json::from_str(r#"{"type":"fixed","amount":10000}"#).unwrap();
        assert_eq!(plan, CommissionPlan::Fixed { amount: 10000 });

        let json = serde_json::to_string(&CommissionPlan::Percentage { rate: 12.0 }).unwrap();
        assert_eq!(json, r#"{"type":"percentage","rate":12.0}"#);
    }
}
