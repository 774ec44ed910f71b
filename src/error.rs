use thiserror::Error;

#[derive(Debug, Error)]
pub enum NutrigeneError {
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    #[error("Risk scoring error: {0}")]
    RiskScoring(String),

    #[error("Recommendation error: {0}")]
    Recommendation(String),

    #[error("Genetic data validation error: {0}")]
    DataValidation(String),
}

pub type Result<T> = std::result::Result<T, NutrigeneError>;
