use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "Unable to relieve the initial overlaps within {steps_taken} steps (budget {budget})"
    )]
    RelaxationExceeded { steps_taken: usize, budget: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
