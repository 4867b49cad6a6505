use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmiEngineError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation not applicable: {0}")]
    ComputationNotApplicable(String),

    #[error("Installment #{emi_number} not found in schedule")]
    InstallmentNotFound { emi_number: u32 },

    #[error("Schedule integrity violated: {0}")]
    ScheduleIntegrity(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations")]
    ConvergenceFailure { function: String, iterations: u32 },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EmiEngineError {
    fn from(e: serde_json::Error) -> Self {
        EmiEngineError::SerializationError(e.to_string())
    }
}

impl EmiEngineError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        EmiEngineError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
