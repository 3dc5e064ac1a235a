//! Error taxonomy for the dashboard core.
//!
//! Validation errors stay inside the form/filter layer. Request errors are
//! caught at the dashboard boundary and stored per tab as an [`ErrorMessage`].

use std::fmt;

/// One failed form rule, attached to the field it should be shown next to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every rule a form failed, in rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The first message for `field`, which is what an inline hint shows.
    pub fn first_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(value)` when nothing failed.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Errors produced by the dashboard core.
#[derive(Debug)]
pub enum DashboardError {
    /// Form or date constraints failed. Recovered locally.
    Validation(ValidationErrors),
    /// Login failed. The message is shown as-is above the login form.
    Authentication(String),
    /// A request came back `401`. The login redirect has already fired.
    Authorization,
    /// The server could not be reached or did not answer in time.
    Network(String),
    /// The server answered with a non-success status.
    Server {
        status: u16,
        message: String,
        code: Option<i64>,
    },
    /// The persisted session could not be sealed or opened.
    Session(String),
    /// A cache entry could not be decoded.
    Cache(String),
    /// Nothing more specific applies.
    Unknown(String),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "Validation failed: {}", errors),
            Self::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Self::Authorization => write!(f, "{}", status_message(401, None)),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Server { status, message, .. } => {
                write!(f, "Server error {}: {}", status, message)
            }
            Self::Session(msg) => write!(f, "Session error: {}", msg),
            Self::Cache(msg) => write!(f, "Cache error: {}", msg),
            Self::Unknown(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<affiliation_api::Error> for DashboardError {
    fn from(e: affiliation_api::Error) -> Self {
        use affiliation_api::Error as ApiError;
        match e {
            ApiError::RequestFailed => Self::Network("Network Error".to_string()),
            ApiError::Timeout => Self::Network(format!(
                "timeout of {}ms exceeded",
                affiliation_api::REQUEST_TIMEOUT.as_millis()
            )),
            ApiError::HttpStatus { status: 401, .. } => Self::Authorization,
            ApiError::HttpStatus {
                status,
                reason,
                message,
                code,
                ..
            } => Self::Server {
                status,
                // A structured backend message is only trusted with its code.
                message: match (message, code) {
                    (Some(message), Some(_)) => message,
                    _ => status_message(status, reason.as_deref()),
                },
                code,
            },
            ApiError::ParseFailed(msg) => Self::Unknown(msg),
        }
    }
}

impl From<ValidationErrors> for DashboardError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Cache(e.to_string())
    }
}

/// Human-readable text for an HTTP status.
pub fn status_message(status: u16, reason: Option<&str>) -> String {
    match status {
        400 => "Bad request: Please check your input parameters".to_string(),
        401 => "Unauthorized: Authentication required".to_string(),
        403 => "Forbidden: You do not have permission to access this resource".to_string(),
        404 => "Not found: The requested resource was not found".to_string(),
        422 => "Validation error: The provided data is invalid".to_string(),
        500 => "Internal server error: Please try again later".to_string(),
        502 => "Bad gateway: Server is temporarily unavailable".to_string(),
        503 => "Service unavailable: Server is overloaded or down for maintenance".to_string(),
        _ => format!(
            "HTTP Error {}: {}",
            status,
            reason.filter(|r| !r.is_empty()).unwrap_or("Unknown error")
        ),
    }
}

/// What a tab shows when its request failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    pub message: String,
    pub status_code: Option<i64>,
}

impl From<&DashboardError> for ErrorMessage {
    fn from(e: &DashboardError) -> Self {
        match e {
            DashboardError::Server {
                status,
                message,
                code,
            } => ErrorMessage {
                message: message.clone(),
                status_code: Some(code.unwrap_or(i64::from(*status))),
            },
            DashboardError::Authorization => ErrorMessage {
                message: status_message(401, None),
                status_code: Some(401),
            },
            DashboardError::Network(msg)
            | DashboardError::Authentication(msg)
            | DashboardError::Session(msg)
            | DashboardError::Cache(msg)
            | DashboardError::Unknown(msg) => ErrorMessage {
                message: msg.clone(),
                status_code: None,
            },
            DashboardError::Validation(errors) => ErrorMessage {
                message: errors.to_string(),
                status_code: None,
            },
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Error {}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
