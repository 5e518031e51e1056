//! # Apparition pipeline facade
//!
//! [`Apparition`] owns the pluggable pieces of the pipeline (ephemeris,
//! distance heuristic, search configuration) and exposes the three
//! operations callers care about:
//!
//! - [`Apparition::determine_orbit`]: observations → fitted state vector
//! - [`Apparition::find_closest_approach`]: state vector → minimum-distance
//!   event over the configured horizon
//! - [`Apparition::compute`]: the full run, producing a serializable
//!   [`ComputeReport`]
//!
//! `compute` enforces a stricter observation minimum (5) than the estimator's
//! own floor (3): the full pipeline compounds the fit error through a year of
//! propagation, so it demands a longer arc. A fitted state that turns out to
//! be unbound is *not* fatal to `compute` — the element record is omitted and
//! the closest-approach search still runs on the raw state vector.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::apparition_errors::ApparitionError;
use crate::closest_approach::{find_closest_approach, ClosestApproachResult, SearchOptions};
use crate::constants::{ObservationId, Observations};
use crate::ephemeris::{BuiltinEarthEphemeris, Ephemeris};
use crate::estimator;
use crate::keplerian_element::OrbitalElements;
use crate::observations::{DistancePolicy, LinearRamp};
use crate::state_vector::StateVector;

/// Minimum number of observations accepted by [`Apparition::compute`].
pub const MIN_COMPUTE_OBSERVATIONS: usize = 5;

/// Outcome of a full pipeline run.
///
/// `orbit` is `None` when the fitted state was not a bound ellipse; the
/// closest-approach fields are always populated (a run that cannot produce
/// them fails instead).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeReport {
    pub orbit: Option<OrbitalElements>,
    pub closest_approach: ClosestApproachResult,
    pub observation_ids: Vec<ObservationId>,
}

impl fmt::Display for ComputeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.orbit {
            Some(elements) => writeln!(f, "{elements}")?,
            None => writeln!(f, "orbit: unbound trajectory, elements omitted")?,
        }
        writeln!(f, "{}", self.closest_approach)?;
        write!(f, "observations used: {}", self.observation_ids.len())
    }
}

/// Entry point of the orbit pipeline.
///
/// Holds the Earth ephemeris, the assumed-distance heuristic, and the
/// closest-approach search configuration. [`Apparition::new`] wires the
/// built-in defaults; [`Apparition::with_components`] injects replacements
/// (a tabulated ephemeris, an externally solved distance table, a shorter
/// horizon) without touching the pipeline itself.
pub struct Apparition {
    ephemeris: Arc<dyn Ephemeris>,
    distance_policy: Box<dyn DistancePolicy>,
    search: SearchOptions,
}

impl Default for Apparition {
    fn default() -> Self {
        Apparition::new()
    }
}

impl Apparition {
    /// Pipeline with the built-in analytic Earth ephemeris, the stock
    /// distance ramp, and a one-year daily search.
    pub fn new() -> Self {
        Apparition {
            ephemeris: Arc::new(BuiltinEarthEphemeris),
            distance_policy: Box::new(LinearRamp::default()),
            search: SearchOptions::default(),
        }
    }

    /// Pipeline with caller-supplied components.
    pub fn with_components(
        ephemeris: Arc<dyn Ephemeris>,
        distance_policy: Box<dyn DistancePolicy>,
        search: SearchOptions,
    ) -> Self {
        Apparition {
            ephemeris,
            distance_policy,
            search,
        }
    }

    /// Fit a heliocentric state vector from the observation arc.
    ///
    /// See [`estimator::determine_orbit`]; this accepts the estimator's
    /// 3-observation floor, not `compute`'s stricter one.
    pub fn determine_orbit(
        &self,
        observations: &Observations,
    ) -> Result<StateVector, ApparitionError> {
        estimator::determine_orbit(observations, self.distance_policy.as_ref(), self.ephemeris.as_ref())
    }

    /// Search the configured horizon for the minimum Earth distance.
    pub fn find_closest_approach(
        &self,
        state: &StateVector,
    ) -> Result<ClosestApproachResult, ApparitionError> {
        find_closest_approach(state, self.ephemeris.as_ref(), &self.search)
    }

    /// Run the full pipeline: fit, element conversion, approach search.
    ///
    /// Arguments
    /// ---------
    /// * `observations`: the sighting arc, at least
    ///   [`MIN_COMPUTE_OBSERVATIONS`] long
    ///
    /// Return
    /// ------
    /// * a [`ComputeReport`] with the element record (omitted for unbound
    ///   fits), the closest-approach event, and the observation identifiers
    ///   in epoch order
    ///
    /// Errors
    /// ------
    /// * [`ApparitionError::InsufficientData`] with fewer than 5 observations
    /// * any estimator or search error, unchanged
    pub fn compute(&self, observations: &Observations) -> Result<ComputeReport, ApparitionError> {
        if observations.len() < MIN_COMPUTE_OBSERVATIONS {
            return Err(ApparitionError::InsufficientData {
                required: MIN_COMPUTE_OBSERVATIONS,
                given: observations.len(),
            });
        }

        let state = self.determine_orbit(observations)?;
        info!(
            epoch = %state.epoch,
            radius_km = state.radius(),
            speed_km_s = state.speed(),
            "state vector fitted"
        );

        let orbit = match state.to_elements() {
            Ok(elements) => Some(elements),
            Err(ApparitionError::NonEllipticalOrbit {
                semi_major_axis_au,
                eccentricity,
            }) => {
                warn!(
                    semi_major_axis_au,
                    eccentricity, "fitted state is unbound, omitting element record"
                );
                None
            }
            Err(err) => return Err(err),
        };

        let closest_approach = self.find_closest_approach(&state)?;

        let mut ordered: Vec<_> = observations.iter().collect();
        ordered.sort_by(|a, b| a.epoch.cmp(&b.epoch));
        let observation_ids = ordered.iter().map(|obs| obs.id).collect();

        Ok(ComputeReport {
            orbit,
            closest_approach,
            observation_ids,
        })
    }
}

#[cfg(test)]
mod apparition_test {
    use super::*;
    use crate::observations::Observation;
    use hifitime::{Duration, Epoch};

    fn daily_obs(count: usize) -> Observations {
        let start = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);
        (0..count)
            .map(|i| {
                Observation::new(
                    i as u64 + 1,
                    10.0 + 0.125 * i as f64,
                    20.0 + 0.25 * i as f64,
                    start + Duration::from_days(i as f64),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_compute_requires_five_observations() {
        let pipeline = Apparition::new();
        let err = pipeline.compute(&daily_obs(4)).unwrap_err();
        assert_eq!(
            err,
            ApparitionError::InsufficientData {
                required: 5,
                given: 4
            }
        );
    }

    #[test]
    fn test_compute_ids_follow_epoch_order() {
        let pipeline = Apparition::new();
        let mut obs = daily_obs(5);
        obs.swap(0, 3);
        obs.swap(2, 4);
        let report = pipeline.compute(&obs).unwrap();
        assert_eq!(report.observation_ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_determine_orbit_accepts_three() {
        let pipeline = Apparition::new();
        assert!(pipeline.determine_orbit(&daily_obs(3)).is_ok());
    }
}
