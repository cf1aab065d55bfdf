use std::time::Duration;
use thiserror::Error;

/// Error type for invalid inputs and failed computations.
#[derive(Error, Debug)]
pub enum PhasekinError {
    /// An element symbol not present in the periodic table.
    #[error("unknown element symbol: {0}")]
    UnknownElement(String),
    /// One or more of the algorithm-required elements was not supplied.
    #[error("missing required elements: {}", .0.join(", "))]
    MissingElements(Vec<String>),
    /// The same element symbol appeared twice in a composition.
    #[error("duplicate element entry: {0}")]
    DuplicateElement(String),
    /// A configuration value violates a precondition (e.g. Ae1 >= Ae3).
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// The Ae3 fixed-point iteration hit its cap without converging.
    /// Carries the last solver state for diagnosis.
    #[error(
        "equilibrium solve did not converge after {iterations} iterations \
         (T = {temperature} K, z = {z})"
    )]
    EquilibriumNotConverged {
        temperature: f64,
        z: f64,
        iterations: usize,
    },
    /// A negative or non-finite temperature appeared mid-solve.
    #[error("invalid equilibrium state: {detail} (T = {temperature} K)")]
    InvalidEquilibriumState { temperature: f64, detail: String },
    /// The Ae3(carbon) curve never met Ae1 within the swept carbon grid.
    /// Retryable with a larger grid bound.
    #[error("no eutectoid crossing found below {carbon_limit} wt% carbon")]
    EutectoidNotFound { carbon_limit: f64 },
    /// A result buffer was asked to shrink. Contract violation, not
    /// recoverable in correct usage.
    #[error("result buffer cannot shrink from {capacity} to {requested} rows")]
    InvalidResize { requested: usize, capacity: usize },
    /// A sub-computation exceeded its wall-clock budget.
    #[error("{stage} computation exceeded its {limit:?} time limit")]
    Timeout {
        stage: &'static str,
        limit: Duration,
    },
    /// Division-by-zero-class failure inside the kinetics.
    #[error("numeric failure: {0}")]
    Numeric(String),
}

/// Convenience type for `Result<T, PhasekinError>`.
pub type PhasekinResult<T> = Result<T, PhasekinError>;
