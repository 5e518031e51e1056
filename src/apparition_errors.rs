use hifitime::Duration;
use thiserror::Error;

/// Error taxonomy of the orbit pipeline.
///
/// The only automatic recoveries in the crate are the propagator's fallback
/// ladder and the closest-approach search's skip-on-failure; every other
/// error propagates to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApparitionError {
    #[error("Invalid angle: {0}")]
    InvalidAngle(String),

    #[error("Insufficient data: {required} observations required, {given} given")]
    InsufficientData { required: usize, given: usize },

    #[error("Degenerate fit: observation timestamps do not span a usable arc")]
    DegenerateFit,

    #[error(
        "Fitted state is not a bound ellipse (a = {semi_major_axis_au} AU, e = {eccentricity})"
    )]
    NonEllipticalOrbit {
        semi_major_axis_au: f64,
        eccentricity: f64,
    },

    #[error("Propagation failed after exhausting all fallback strategies (offset = {offset_days} days)")]
    PropagationFailed { offset_days: f64 },

    #[error("No sampled offset could be propagated over the search horizon")]
    PropagationExhausted,

    #[error("Search horizon must be strictly positive, got {0}")]
    InvalidHorizon(Duration),

    #[error("Computation cancelled by caller")]
    Cancelled,
}
