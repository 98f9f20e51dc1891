use thiserror::Error;

use crate::flows::FlowTransitionError;

pub const LOAD_CART_FAILED: &str = "Failed to load random cart. Please try again.";
pub const QUOTE_CONNECT_FAILED: &str =
    "Failed to connect to shipping service. Please try again later.";
pub const QUOTE_UNKNOWN_ERROR: &str = "An unknown error occurred.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Transport failure; no response was received.
    #[error("{0}")]
    Network(String),
    /// The remote service answered with a non-success status.
    #[error("{0}")]
    Service(String),
    #[error("missing required fields: {}", missing_fields.join(", "))]
    Validation { missing_fields: Vec<String> },
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
}

impl CartError {
    pub fn validation(missing_fields: &[&str]) -> Self {
        Self::Validation {
            missing_fields: missing_fields.iter().map(|field| (*field).to_owned()).collect(),
        }
    }

    pub fn quote_rejected(message: Option<&str>) -> Self {
        let message =
            message.filter(|value| !value.trim().is_empty()).unwrap_or(QUOTE_UNKNOWN_ERROR);
        Self::Service(format!("Failed to quote shipping: {message}"))
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Service(_) => "service",
            Self::Validation { .. } => "validation",
            Self::Flow(_) => "flow",
        }
    }

    /// Whether the error belongs in `SessionState::last_error`.
    ///
    /// Validation and navigation problems are reported as notices only.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Service(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Network(message) | Self::Service(message) => message.clone(),
            Self::Validation { missing_fields } => format!(
                "All shipping fields are required (missing: {}).",
                missing_fields.join(", ")
            ),
            Self::Flow(_) => "That step is not available from the current page.".to_owned(),
        }
    }
}
