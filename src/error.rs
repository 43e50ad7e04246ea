use thiserror::Error;

/// Main error type for aws-mocker operations.
///
/// Every variant is terminal for the run; nothing in the pipeline retries.
#[derive(Error, Debug)]
pub enum MockerError {
    #[error("failed to load packages: {0}")]
    Load(String),

    #[error("source diagnostics: {0}")]
    SourceDiagnostic(String),

    #[error("unexpected symbol shape: {0}")]
    StructuralMismatch(String),

    #[error("template error: {0}")]
    Render(#[from] tera::Error),

    #[error("format error: {0}")]
    Format(String),

    #[error("failed to write output: {0}")]
    Sink(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MockerError>;
