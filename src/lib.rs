//! # Apparition
//!
//! **Apparition** determines a preliminary heliocentric orbit from a short arc
//! of angular sightings (right ascension / declination / epoch) and predicts
//! the body's closest approach to Earth over a bounded future window.
//!
//! ## Pipeline
//!
//! 1. **Directional estimates** — each sighting's line of sight is scaled by
//!    an assumed geocentric distance ([`LinearRamp`] by default) and anchored
//!    at Earth's heliocentric position ([`BuiltinEarthEphemeris`]).
//! 2. **State estimation** — per-axis linear least-squares over the arc yields
//!    a [`StateVector`] at the median observation epoch.
//! 3. **Element conversion** — a reporting-only [`OrbitalElements`] record,
//!    derived from the state vector and never fed back into propagation.
//! 4. **Propagation** — universal-variable two-body Kepler solve with a
//!    tolerance-loosening fallback ladder ending in a Cowell RK4 integrator.
//! 5. **Closest approach** — daily sampling of the Earth distance over one
//!    year, skipping unpropagatable offsets, with an optional rayon fan-out
//!    behind the `parallel` feature.
//!
//! The [`Apparition`] facade wires these together; every component behind it
//! (ephemeris, distance heuristic, search options) can be replaced through
//! [`Apparition::with_components`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use apparition::{Apparition, Observation, Observations};
//! use hifitime::{Duration, Epoch};
//!
//! # fn main() -> Result<(), apparition::ApparitionError> {
//! let start = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);
//! let observations: Observations = (0..5u64)
//!     .map(|i| {
//!         Observation::new(
//!             i + 1,
//!             10.0 + 0.125 * i as f64,
//!             20.0 + 0.25 * i as f64,
//!             start + Duration::from_days(i as f64),
//!         )
//!     })
//!     .collect::<Result<_, _>>()?;
//!
//! let report = Apparition::new().compute(&observations)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod apparition;
pub mod apparition_errors;
pub mod closest_approach;
pub mod constants;
pub mod ephemeris;
pub mod estimator;
pub mod kepler;
pub mod keplerian_element;
pub mod observations;
pub mod state_vector;

pub use apparition::{Apparition, ComputeReport, MIN_COMPUTE_OBSERVATIONS};
pub use apparition_errors::ApparitionError;
pub use closest_approach::{
    find_closest_approach, CancelToken, ClosestApproachResult, OnCancel, SearchOptions,
};
pub use constants::{Degree, Hour, Kilometer, KmPerSec, ObservationId, Observations, AU, SUN_MU};
pub use ephemeris::{BuiltinEarthEphemeris, Ephemeris};
pub use estimator::{determine_orbit, MIN_OBSERVATIONS};
pub use keplerian_element::OrbitalElements;
pub use observations::{
    line_of_sight, DirectionalEstimate, DistancePolicy, LinearRamp, Observation,
    TabulatedDistances,
};
pub use state_vector::StateVector;
