use thiserror::Error;

/// Error taxonomy for the ephemeris kernel.
///
/// Configuration errors (`InvalidStepSize`, `Io`) abort a whole run.
/// Invariant violations (`EllipseOrdering`, `InvalidRadarProfile`) indicate
/// precision or input-data defects and are surfaced to the caller rather than
/// terminating the process. The `*Unavailable` variants are the per-section
/// statuses a composite-report assembler uses to note which parts of a report
/// could not be produced.
#[derive(Error, Debug)]
pub enum EphemerixError {
    #[error("Invalid or zero step size: {0}")]
    InvalidStepSize(String),

    #[error("Invalid run configuration: {0}")]
    Config(String),

    #[error("Unable to perform file operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("Uncertainty ellipse eigenvalues out of order (z1 = {z1}, z2 = {z2})")]
    EllipseOrdering { z1: f64, z2: f64 },

    #[error("Uncertainty fit requires at least 2 realizations, got {0}")]
    NotEnoughRealizations(usize),

    #[error("Invalid radar profile entry: {0}")]
    InvalidRadarProfile(String),

    #[error("Orbit propagation failed: {0}")]
    Propagation(String),

    #[error("Observer state unavailable: {0}")]
    ObserverState(String),

    #[error("Orbital elements writer failed: {0}")]
    ElementsWriter(String),

    #[error("Observations section unavailable")]
    ObservationsUnavailable,

    #[error("Residuals section unavailable")]
    ResidualsUnavailable,

    #[error("Orbital elements section unavailable")]
    ElementsUnavailable,

    #[error("Ephemeris section unavailable")]
    EphemerisUnavailable,
}
