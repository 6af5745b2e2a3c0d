use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LpeResult<T> = Result<T, LpeError>;

/// What went wrong before a verdict could be reached. Each category owns one
/// process exit code above the 0/1 pass/fail codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LpeErrorCategory {
    /// Malformed netlist, scenario, directive or tolerance.
    InputValidationError,
    /// Missing inputs and filesystem failures around run artifacts.
    IoSystemError,
    InternalError,
}

impl LpeErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::InternalError => 4,
        }
    }

    /// Placeholder prefix shared by every error of the category.
    pub const fn placeholder_prefix(self) -> &'static str {
        match self {
            Self::InputValidationError => "INPUT",
            Self::IoSystemError => "IO",
            Self::InternalError => "INTERNAL",
        }
    }
}

/// Fatal, caller-visible failure of a comparison run.
///
/// Data outcomes (tolerance or name mismatches, count mismatches) are never
/// carried by this type; they live in the verdicts of the comparison results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpeError {
    category: LpeErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl LpeError {
    pub fn new(
        category: LpeErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        debug_assert!(
            placeholder
                .strip_prefix(category.placeholder_prefix())
                .is_some_and(|rest| rest.starts_with('.')),
            "placeholder {placeholder} does not belong to {category:?}"
        );
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LpeErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LpeErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LpeErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> LpeErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for LpeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.placeholder, self.message)
    }
}

impl Error for LpeError {}
