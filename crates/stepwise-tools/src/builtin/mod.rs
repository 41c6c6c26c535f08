//! Built-in tools

pub mod finance;
pub mod verify;

pub use finance::{BonusTool, CompoundInterestTool, CompoundingPeriodsTool, QuarterlyRateTool};
pub use verify::{verify_calculation, verify_compounding_periods, verify_quarterly_rate};

use crate::{registry::ToolRegistryBuilder, Result};

/// Register the compound interest toolbox
pub fn register_finance_tools(builder: &mut ToolRegistryBuilder) -> Result<&mut ToolRegistryBuilder> {
    builder
        .register(QuarterlyRateTool::new())?
        .register(CompoundingPeriodsTool::new())?
        .register(CompoundInterestTool::new())?
        .register(BonusTool::new())?
        .register(verify_calculation())?
        .register(verify_quarterly_rate())?
        .register(verify_compounding_periods())
}

/// Builder preloaded with the compound interest toolbox
pub fn finance_toolbox() -> Result<ToolRegistryBuilder> {
    let mut builder = ToolRegistryBuilder::new();
    register_finance_tools(&mut builder)?;
    Ok(builder)
}
