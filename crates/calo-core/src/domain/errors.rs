use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CaloResult<T> = Result<T, CaloError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaloErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    EventProtocolError,
    InternalError,
}

impl CaloErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::EventProtocolError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::EventProtocolError => "EventProtocolError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Error shared by the layout, aggregation and table layers.
///
/// The placeholder is a stable dotted identifier (`INPUT.CHANNEL_INDEX`,
/// `EVENT.NOT_IN_EVENT`, ...) that tests and callers can match on without
/// depending on message wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaloError {
    category: CaloErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl CaloError {
    pub fn new(
        category: CaloErrorCategory,
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
            CaloErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(CaloErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn event_protocol(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(CaloErrorCategory::EventProtocolError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(CaloErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> CaloErrorCategory {
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

impl Display for CaloError {
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

impl Error for CaloError {}

#[cfg(test)]
mod tests {
    use super::{CaloError, CaloErrorCategory};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (CaloErrorCategory::Success, 0, "Success"),
            (
                CaloErrorCategory::InputValidationError,
                2,
                "InputValidationError",
            ),
            (CaloErrorCategory::IoSystemError, 3, "IoSystemError"),
            (CaloErrorCategory::EventProtocolError, 4, "EventProtocolError"),
            (CaloErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = CaloError::event_protocol(
            "EVENT.NOT_IN_EVENT",
            "record_channel_hit called while idle",
        );

        assert_eq!(error.exit_code(), 4);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [EVENT.NOT_IN_EVENT] record_channel_hit called while idle"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 4")
        );
        assert_eq!(
            error.to_string(),
            "EventProtocolError [EVENT.NOT_IN_EVENT] record_channel_hit called while idle"
        );
    }
}
