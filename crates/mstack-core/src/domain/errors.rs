use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StackResult<T> = Result<T, StackError>;
pub type TableResult<T> = StackResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl StackErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackError {
    category: StackErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl StackError {
    pub fn new(
        category: StackErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            StackErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(StackErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(StackErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(StackErrorCategory::InternalError, placeholder, message)
    }

    /// Required input table is absent.
    pub fn missing_file(path: &std::path::Path) -> Self {
        Self::io_system(
            "IO.TABLE_NOT_FOUND",
            format!("file not found: '{}'", path.display()),
        )
    }

    /// Required emission line absent from a flux mapping.
    pub fn missing_line(line: &str) -> Self {
        Self::input_validation(
            "INPUT.MISSING_LINE",
            format!("emission line '{}' is required but was not supplied", line),
        )
    }

    pub fn missing_column(column: &str, table: &str) -> Self {
        Self::input_validation(
            "INPUT.MISSING_COLUMN",
            format!("column '{}' not found in table '{}'", column, table),
        )
    }

    pub const fn category(&self) -> StackErrorCategory {
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
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for StackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for StackError {}
