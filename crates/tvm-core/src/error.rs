use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvmError {
    #[error("Invalid domain: {field}: {reason}")]
    InvalidDomain { field: String, reason: String },

    #[error("Non-convergent: {function} did not converge after {iterations} iterations (last delta: {last_delta}): {reason}")]
    NonConvergent {
        function: String,
        iterations: u32,
        last_delta: Decimal,
        reason: String,
    },

    #[error("Payment insufficient: payment {payment} does not exceed {required}")]
    PaymentInsufficient { payment: Decimal, required: Decimal },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Numeric overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TvmError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        TvmError::InvalidDomain {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn non_convergent(
        function: &str,
        iterations: u32,
        last_delta: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        TvmError::NonConvergent {
            function: function.into(),
            iterations,
            last_delta,
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        TvmError::Overflow {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for TvmError {
    fn from(e: serde_json::Error) -> Self {
        TvmError::SerializationError(e.to_string())
    }
}
