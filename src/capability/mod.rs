//! Tool-usage rollups, deduplicated tool requests, and deprecation/
//! development-priority reporting (§4.10, capability half).

pub mod system;

pub use system::CapabilitySystem;
pub use crate::feedback::types::{CapabilityGapReport, ToolRequest, ToolUsageStat};
