use thiserror::Error;

use mxexpr::error::ExprError;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("no {kind} named '{name}'")]
    NotFound { kind: &'static str, name: String },

    #[error("failed to load global {0} definitions")]
    LoadFailed(&'static str),

    #[error("calculation aborted after {steps} steps")]
    Aborted { steps: u64 },

    #[error(transparent)]
    Expr(#[from] ExprError),
}

pub type CalcResult<T> = Result<T, CalcError>;
