use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReftrackerError {
    InvalidArgument(String),
    NotFound(String),
    MethodNotAllowed(String),
    CapacityExhausted(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    DateParse(String),
    Internal(String),
}

impl ReftrackerError {
    /// Stable diagnostic code, shown in CLI output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            ReftrackerError::InvalidArgument(_) => "E001",
            ReftrackerError::NotFound(_) => "E002",
            ReftrackerError::MethodNotAllowed(_) => "E003",
            ReftrackerError::CapacityExhausted(_) => "E004",
            ReftrackerError::DatabaseConfig(_) => "E005",
            ReftrackerError::DatabaseConnection(_) => "E006",
            ReftrackerError::DatabaseOperation(_) => "E007",
            ReftrackerError::FileOperation(_) => "E008",
            ReftrackerError::Serialization(_) => "E009",
            ReftrackerError::DateParse(_) => "E010",
            ReftrackerError::Internal(_) => "E011",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ReftrackerError::InvalidArgument(_) => "Invalid Argument",
            ReftrackerError::NotFound(_) => "Resource Not Found",
            ReftrackerError::MethodNotAllowed(_) => "Method Not Allowed",
            ReftrackerError::CapacityExhausted(_) => "Capacity Exhausted",
            ReftrackerError::DatabaseConfig(_) => "Database Configuration Error",
            ReftrackerError::DatabaseConnection(_) => "Database Connection Error",
            ReftrackerError::DatabaseOperation(_) => "Database Operation Error",
            ReftrackerError::FileOperation(_) => "File Operation Error",
            ReftrackerError::Serialization(_) => "Serialization Error",
            ReftrackerError::DateParse(_) => "Date Parse Error",
            ReftrackerError::Internal(_) => "Internal Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ReftrackerError::InvalidArgument(msg) => msg,
            ReftrackerError::NotFound(msg) => msg,
            ReftrackerError::MethodNotAllowed(msg) => msg,
            ReftrackerError::CapacityExhausted(msg) => msg,
            ReftrackerError::DatabaseConfig(msg) => msg,
            ReftrackerError::DatabaseConnection(msg) => msg,
            ReftrackerError::DatabaseOperation(msg) => msg,
            ReftrackerError::FileOperation(msg) => msg,
            ReftrackerError::Serialization(msg) => msg,
            ReftrackerError::DateParse(msg) => msg,
            ReftrackerError::Internal(msg) => msg,
        }
    }

    /// HTTP status the error maps to on the wire.
    ///
    /// CapacityExhausted and everything storage-related collapse to 500;
    /// the concrete cause stays in the server log, not the response.
    pub fn http_status(&self) -> u16 {
        match self {
            ReftrackerError::InvalidArgument(_) | ReftrackerError::DateParse(_) => 400,
            ReftrackerError::NotFound(_) => 404,
            ReftrackerError::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    /// Colored output for server-mode startup failures.
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// Plain output for CLI mode.
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ReftrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ReftrackerError {}

// Convenience constructors
impl ReftrackerError {
    pub fn invalid_argument<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::InvalidArgument(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::NotFound(msg.into())
    }

    pub fn method_not_allowed<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::MethodNotAllowed(msg.into())
    }

    pub fn capacity_exhausted<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::CapacityExhausted(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::DateParse(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        ReftrackerError::Internal(msg.into())
    }
}

impl From<sea_orm::DbErr> for ReftrackerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ReftrackerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ReftrackerError {
    fn from(err: std::io::Error) -> Self {
        ReftrackerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ReftrackerError {
    fn from(err: serde_json::Error) -> Self {
        ReftrackerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ReftrackerError {
    fn from(err: chrono::ParseError) -> Self {
        ReftrackerError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReftrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ReftrackerError::invalid_argument("bad").http_status(), 400);
        assert_eq!(ReftrackerError::not_found("missing").http_status(), 404);
        assert_eq!(ReftrackerError::method_not_allowed("GET").http_status(), 405);
        // Internal details must not leak a distinct status
        assert_eq!(ReftrackerError::capacity_exhausted("ids").http_status(), 500);
        assert_eq!(ReftrackerError::database_operation("oops").http_status(), 500);
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ReftrackerError::not_found("agent Ab3kM9");
        assert_eq!(err.to_string(), "Resource Not Found: agent Ab3kM9");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ReftrackerError = parse_err.into();
        assert!(matches!(err, ReftrackerError::Serialization(_)));
    }
}
