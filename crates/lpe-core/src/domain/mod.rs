pub mod errors;

pub use errors::{LpeError, LpeErrorCategory, LpeResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// LVS tool that produced the layout netlist feeding the extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LvsTool {
    Icv,
    Calibre,
    Pvs,
    Pegasus,
}

impl LvsTool {
    pub const ALL: [LvsTool; 4] = [Self::Icv, Self::Calibre, Self::Pvs, Self::Pegasus];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Icv => "icv",
            Self::Calibre => "calibre",
            Self::Pvs => "pvs",
            Self::Pegasus => "pegasus",
        }
    }

    /// Only ICV marks degenerate diffusion properties with a sentinel value.
    pub const fn requires_residual_property_gate(self) -> bool {
        matches!(self, Self::Icv)
    }
}

impl Display for LvsTool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for LvsTool {
    type Err = LpeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == value)
            .ok_or_else(|| {
                LpeError::input_validation(
                    "INPUT.LVS_TOOL",
                    format!(
                        "lvs tool '{}' is not supported (expected one of icv, calibre, pvs, pegasus)",
                        value
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::LvsTool;

    #[test]
    fn lvs_tool_parses_known_names_only() {
        assert_eq!("icv".parse::<LvsTool>().ok(), Some(LvsTool::Icv));
        assert_eq!("pegasus".parse::<LvsTool>().ok(), Some(LvsTool::Pegasus));

        let error = "hercules"
            .parse::<LvsTool>()
            .expect_err("unknown tool should be rejected");
        assert_eq!(error.placeholder(), "INPUT.LVS_TOOL");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn residual_gate_applies_to_icv_only() {
        assert!(LvsTool::Icv.requires_residual_property_gate());
        assert!(!LvsTool::Calibre.requires_residual_property_gate());
        assert!(!LvsTool::Pvs.requires_residual_property_gate());
    }
}
