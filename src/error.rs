use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the stache engine.
///
/// Compile errors and configuration errors are always surfaced to the
/// caller; render errors are surfaced unless a caller-installed
/// missing-value policy tolerates the condition. The type is `Clone` so
/// that concurrent waiters on a single compilation can share one outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Compilation errors
    #[error("invalid delimiters: {0}")]
    InvalidDelimiters(String),

    #[error("invalid tag on line {line}: {message}")]
    InvalidTag { message: String, line: usize },

    #[error("invalid section end on line {line}: {message}")]
    InvalidSectionEnd { message: String, line: usize },

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("I/O error: {0}")]
    Io(String),

    // Template loading errors
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template loading error: {0}")]
    TemplateLoading(String),

    // Rendering errors
    #[error("missing partial: {0}")]
    MissingPartial(String),

    #[error("missing extend: {0}")]
    MissingExtend(String),

    #[error("recursion limit {limit} exceeded while rendering '{name}'")]
    RecursionLimitExceeded { name: String, limit: usize },

    #[error("unknown helper: {0}")]
    UnknownHelper(String),

    #[error("invalid helper call on line {line}: {message}")]
    InvalidHelperCall { message: String, line: usize },

    #[error("no value for '{0}'")]
    NoValue(String),

    #[error("render error: {0}")]
    Render(String),

    // Configuration errors
    #[error("invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

impl Error {
    pub fn invalid_delimiters(msg: impl Into<String>) -> Self {
        Self::InvalidDelimiters(msg.into())
    }

    pub fn invalid_tag(msg: impl Into<String>, line: usize) -> Self {
        Self::InvalidTag {
            message: msg.into(),
            line,
        }
    }

    pub fn invalid_section_end(msg: impl Into<String>, line: usize) -> Self {
        Self::InvalidSectionEnd {
            message: msg.into(),
            line,
        }
    }

    pub fn invalid_template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn loading(msg: impl Into<String>) -> Self {
        Self::TemplateLoading(msg.into())
    }

    pub fn invalid_helper_call(msg: impl Into<String>, line: usize) -> Self {
        Self::InvalidHelperCall {
            message: msg.into(),
            line,
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfigValue(msg.into())
    }

    /// Stable error code for logging and assertions.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidDelimiters(_) => "E_COMPILE_INVALID_DELIMITERS",
            Error::InvalidTag { .. } => "E_COMPILE_INVALID_TAG",
            Error::InvalidSectionEnd { .. } => "E_COMPILE_INVALID_SECTION_END",
            Error::InvalidTemplate(_) => "E_COMPILE_INVALID_TEMPLATE",
            Error::Io(_) => "E_COMPILE_IO",
            Error::TemplateNotFound(_) => "E_TEMPLATE_NOT_FOUND",
            Error::TemplateLoading(_) => "E_TEMPLATE_LOADING",
            Error::MissingPartial(_) => "E_RENDER_INVALID_PARTIAL_KEY",
            Error::MissingExtend(_) => "E_RENDER_INVALID_EXTEND_KEY",
            Error::RecursionLimitExceeded { .. } => "E_RENDER_RECURSIVE_LIMIT_EXCEEDED",
            Error::UnknownHelper(_) => "E_RENDER_UNKNOWN_HELPER",
            Error::InvalidHelperCall { .. } => "E_RENDER_INVALID_HELPER_CALL",
            Error::NoValue(_) => "E_RENDER_NO_VALUE",
            Error::Render(_) => "E_RENDER_GENERIC",
            Error::InvalidConfigValue(_) => "E_CONFIG_INVALID_VALUE",
        }
    }

    /// True for errors raised while turning source text into a template.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidDelimiters(_)
                | Error::InvalidTag { .. }
                | Error::InvalidSectionEnd { .. }
                | Error::InvalidTemplate(_)
                | Error::Io(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        Self::Render("failed to write to output sink".to_string())
    }
}
