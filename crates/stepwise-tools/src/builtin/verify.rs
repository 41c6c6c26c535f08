//! Sanity checks the model runs against its own intermediate results

use super::finance::{integer_at, number_at, QUARTERS_PER_YEAR};
use crate::{
    signature::{ParamKind, ResultKind, ToolSignature},
    FnTool, ToolOutput,
};

/// `verify_calculation(final_amount, principal)`: true when the amount grew
pub fn verify_calculation() -> FnTool {
    FnTool::new(
        ToolSignature::new("verify_calculation", ResultKind::Boolean)
            .with_description("Verify that the final amount is greater than the principal")
            .param("final_amount", ParamKind::Number)
            .param("principal", ParamKind::Number),
        |args| {
            let final_amount = number_at(args, 0)?;
            let principal = number_at(args, 1)?;
            Ok(ToolOutput::Boolean(final_amount > principal))
        },
    )
}

/// `verify_quarterly_rate(quarterly_rate, annual_rate)`
pub fn verify_quarterly_rate() -> FnTool {
    FnTool::new(
        ToolSignature::new("verify_quarterly_rate", ResultKind::Boolean)
            .with_description("Verify that quarterly rate is less than annual rate")
            .param("quarterly_rate", ParamKind::Number)
            .param("annual_rate", ParamKind::Number),
        |args| {
            let quarterly = number_at(args, 0)?;
            let annual = number_at(args, 1)?;
            Ok(ToolOutput::Boolean(quarterly < annual))
        },
    )
}

/// `verify_compounding_periods(periods, years)`
pub fn verify_compounding_periods() -> FnTool {
    FnTool::new(
        ToolSignature::new("verify_compounding_periods", ResultKind::Boolean)
            .with_description("Verify that the number of compounding periods is correct")
            .param("periods", ParamKind::Integer)
            .param("years", ParamKind::Integer),
        |args| {
            let periods = integer_at(args, 0)?;
            let years = integer_at(args, 1)?;
            let expected = years.checked_mul(QUARTERS_PER_YEAR);
            Ok(ToolOutput::Boolean(expected == Some(periods)))
        },
    )
}
