//! Compound interest calculation tools

use async_trait::async_trait;

use crate::{
    error::ToolError,
    signature::{Arg, ParamKind, ResultKind, ToolSignature},
    Result, Tool, ToolOutput,
};

/// Quarters per year for quarterly compounding
pub const QUARTERS_PER_YEAR: i64 = 4;

pub(crate) fn number_at(args: &[Arg], index: usize) -> Result<f64> {
    args.get(index)
        .and_then(Arg::as_f64)
        .ok_or_else(|| ToolError::invalid_params(format!("missing number at position {}", index)))
}

pub(crate) fn integer_at(args: &[Arg], index: usize) -> Result<i64> {
    args.get(index)
        .and_then(Arg::as_i64)
        .ok_or_else(|| ToolError::invalid_params(format!("missing integer at position {}", index)))
}

/// Annual rate divided across four quarters
pub struct QuarterlyRateTool {
    signature: ToolSignature,
}

impl QuarterlyRateTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new("calculate_quarterly_rate", ResultKind::Number)
                .with_description("Calculate the quarterly interest rate from annual rate")
                .param("annual_rate", ParamKind::Number),
        }
    }
}

impl Default for QuarterlyRateTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for QuarterlyRateTool {
    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, args: &[Arg]) -> Result<ToolOutput> {
        let annual = number_at(args, 0)?;
        Ok(ToolOutput::Number(annual / QUARTERS_PER_YEAR as f64))
    }
}

/// Number of quarterly periods in a span of years
pub struct CompoundingPeriodsTool {
    signature: ToolSignature,
}

impl CompoundingPeriodsTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new("calculate_compounding_periods", ResultKind::Integer)
                .with_description(
                    "Calculate the number of compounding periods for quarterly compounding",
                )
                .param("years", ParamKind::Integer),
        }
    }
}

impl Default for CompoundingPeriodsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CompoundingPeriodsTool {
    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, args: &[Arg]) -> Result<ToolOutput> {
        let years = integer_at(args, 0)?;
        years
            .checked_mul(QUARTERS_PER_YEAR)
            .map(ToolOutput::Integer)
            .ok_or_else(|| ToolError::execution(format!("{} years overflows the period count", years)))
    }
}

/// A = P(1 + r)^n
pub struct CompoundInterestTool {
    signature: ToolSignature,
}

impl CompoundInterestTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new("calculate_compound_interest", ResultKind::Number)
                .with_description("Calculate compound interest using the formula A = P(1 + r)^n")
                .param("principal", ParamKind::Number)
                .param("rate", ParamKind::Number)
                .param("periods", ParamKind::Integer),
        }
    }
}

impl Default for CompoundInterestTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CompoundInterestTool {
    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, args: &[Arg]) -> Result<ToolOutput> {
        let principal = number_at(args, 0)?;
        let rate = number_at(args, 1)?;
        let periods = integer_at(args, 2)?;

        let periods = i32::try_from(periods)
            .map_err(|_| ToolError::execution(format!("{} periods is out of range", periods)))?;
        let amount = principal * (1.0 + rate).powi(periods);

        tracing::debug!(
            "Compound interest: {} * (1 + {})^{} = {}",
            principal,
            rate,
            periods,
            amount
        );

        if !amount.is_finite() {
            return Err(ToolError::execution("compound interest overflowed"));
        }
        Ok(ToolOutput::Number(amount))
    }
}

/// Bonus paid on a principal
pub struct BonusTool {
    signature: ToolSignature,
}

impl BonusTool {
    pub fn new() -> Self {
        Self {
            signature: ToolSignature::new("calculate_bonus", ResultKind::Number)
                .with_description("Calculate bonus amount on principal")
                .param("principal", ParamKind::Number)
                .param("bonus_rate", ParamKind::Number),
        }
    }
}

impl Default for BonusTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BonusTool {
    fn signature(&self) -> &ToolSignature {
        &self.signature
    }

    async fn call(&self, args: &[Arg]) -> Result<ToolOutput> {
        let principal = number_at(args, 0)?;
        let bonus_rate = number_at(args, 1)?;
        Ok(ToolOutput::Number(principal * bonus_rate))
    }
}
