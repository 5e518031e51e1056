//! # State estimator
//!
//! Fits one [`StateVector`] from a short arc of directional estimates. The
//! body's motion over the few-day arcs this crate targets is treated as
//! locally linear: each position axis gets an independent first-degree
//! least-squares fit against elapsed seconds, the fitted slopes become the
//! velocity, and evaluating the fits at the chosen epoch gives the position.
//! This is a kinematic interpolation standing in for a physical orbit solve,
//! and it is only as good as the injected distance heuristic.
//!
//! The chosen epoch is the median-indexed observation's timestamp — for even
//! counts, the earlier of the two middle indices — so the returned state's
//! epoch always equals one observation's epoch exactly.

use itertools::izip;
use nalgebra::Vector3;

use crate::apparition_errors::ApparitionError;
use crate::constants::{Observations, SUN_MU};
use crate::ephemeris::Ephemeris;
use crate::observations::{DirectionalEstimate, DistancePolicy};
use crate::state_vector::StateVector;

/// Minimum number of observations accepted by the estimator.
pub const MIN_OBSERVATIONS: usize = 3;

/// Per-axis first-degree least-squares fit: returns (intercept, slope).
///
/// `None` when the abscissas have no spread (all timestamps identical), in
/// which case the slope is undefined.
fn linear_fit(t: &[f64], x: &[f64]) -> Option<(f64, f64)> {
    let n = t.len() as f64;
    let t_mean = t.iter().sum::<f64>() / n;
    let x_mean = x.iter().sum::<f64>() / n;

    let denom: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }

    let numer: f64 = izip!(t, x).map(|(ti, xi)| (ti - t_mean) * (xi - x_mean)).sum();
    let slope = numer / denom;
    Some((x_mean - slope * t_mean, slope))
}

/// Fit a heliocentric state vector from an ordered observation sequence.
///
/// Observations are sorted by epoch (stable, so equal timestamps keep their
/// input order), promoted to directional estimates with the injected distance
/// policy, and fitted axis-by-axis.
///
/// Arguments
/// ---------
/// * `observations`: the sighting sequence, at least [`MIN_OBSERVATIONS`] long
/// * `policy`: assumed-distance heuristic, indexed in epoch order
/// * `ephemeris`: Earth state provider used to anchor each line of sight
///
/// Return
/// ------
/// * the fitted state at the median observation's epoch, with μ = GM☉
///
/// Errors
/// ------
/// * [`ApparitionError::InsufficientData`] with fewer than 3 observations
/// * [`ApparitionError::DegenerateFit`] when all timestamps coincide
/// * [`ApparitionError::InvalidAngle`] if an observation slipped past
///   upstream validation
pub fn determine_orbit(
    observations: &Observations,
    policy: &dyn DistancePolicy,
    ephemeris: &dyn Ephemeris,
) -> Result<StateVector, ApparitionError> {
    if observations.len() < MIN_OBSERVATIONS {
        return Err(ApparitionError::InsufficientData {
            required: MIN_OBSERVATIONS,
            given: observations.len(),
        });
    }

    let mut ordered: Vec<_> = observations.iter().collect();
    ordered.sort_by(|a, b| a.epoch.cmp(&b.epoch));

    let estimates: Vec<DirectionalEstimate> = ordered
        .iter()
        .enumerate()
        .map(|(index, obs)| {
            DirectionalEstimate::from_observation(obs, policy.assumed_distance_km(index), ephemeris)
        })
        .collect::<Result<_, _>>()?;

    let first_epoch = estimates[0].epoch;
    let elapsed: Vec<f64> = estimates
        .iter()
        .map(|e| (e.epoch - first_epoch).to_seconds())
        .collect();

    // Median index; even counts take the earlier of the two middle indices.
    let mid = (estimates.len() - 1) / 2;
    let t_mid = elapsed[mid];

    let mut position = Vector3::zeros();
    let mut velocity = Vector3::zeros();
    for axis in 0..3 {
        let samples: Vec<f64> = estimates.iter().map(|e| e.position_km[axis]).collect();
        let (intercept, slope) =
            linear_fit(&elapsed, &samples).ok_or(ApparitionError::DegenerateFit)?;
        position[axis] = intercept + slope * t_mid;
        velocity[axis] = slope;
    }

    Ok(StateVector {
        position_km: position,
        velocity_km_s: velocity,
        epoch: estimates[mid].epoch,
        mu_km3_s2: SUN_MU,
    })
}

#[cfg(test)]
mod estimator_test {
    use super::*;
    use crate::observations::{LinearRamp, Observation};
    use approx::assert_relative_eq;
    use hifitime::{Duration, Epoch};
    use nalgebra::Vector3;
    use smallvec::smallvec;

    struct StillEarth;
    impl Ephemeris for StillEarth {
        fn state(&self, _epoch: Epoch) -> (Vector3<f64>, Vector3<f64>) {
            (Vector3::zeros(), Vector3::zeros())
        }
    }

    fn daily_obs(count: usize) -> Observations {
        let start = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);
        (0..count)
            .map(|i| {
                Observation::new(
                    i as u64 + 1,
                    10.0 + 0.01 * i as f64,
                    20.0 + 0.25 * i as f64,
                    start + Duration::from_days(i as f64),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_epoch_is_median_observation() {
        let obs = daily_obs(5);
        let state = determine_orbit(&obs, &LinearRamp::default(), &StillEarth).unwrap();
        assert_eq!(state.epoch, obs[2].epoch);

        // Even count: earlier of the two middle indices.
        let obs = daily_obs(4);
        let state = determine_orbit(&obs, &LinearRamp::default(), &StillEarth).unwrap();
        assert_eq!(state.epoch, obs[1].epoch);
    }

    #[test]
    fn test_unsorted_input_is_reordered() {
        let mut obs = daily_obs(5);
        obs.swap(0, 4);
        obs.swap(1, 3);
        let state = determine_orbit(&obs, &LinearRamp::default(), &StillEarth).unwrap();

        let sorted = daily_obs(5);
        let reference = determine_orbit(&sorted, &LinearRamp::default(), &StillEarth).unwrap();
        assert_eq!(state, reference);
    }

    #[test]
    fn test_two_observations_insufficient() {
        let obs = daily_obs(2);
        let err = determine_orbit(&obs, &LinearRamp::default(), &StillEarth).unwrap_err();
        assert_eq!(
            err,
            ApparitionError::InsufficientData {
                required: 3,
                given: 2
            }
        );
    }

    #[test]
    fn test_identical_timestamps_degenerate() {
        let epoch = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);
        let obs: Observations = smallvec![
            Observation::new(1, 10.0, 20.0, epoch).unwrap(),
            Observation::new(2, 10.1, 20.2, epoch).unwrap(),
            Observation::new(3, 10.2, 20.4, epoch).unwrap(),
        ];
        let err = determine_orbit(&obs, &LinearRamp::default(), &StillEarth).unwrap_err();
        assert_eq!(err, ApparitionError::DegenerateFit);
    }

    #[test]
    fn test_linear_motion_recovered_exactly() {
        // A body moving on a straight line at constant speed is fitted with
        // zero residual.
        let start = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);
        let obs: Observations = (0..3)
            .map(|i| {
                Observation::new(i as u64, 0.0, 0.0, start + Duration::from_days(i as f64))
                    .unwrap()
            })
            .collect();
        // RA = 0, Dec = 0 keeps the direction fixed on +x; a distance ramp
        // then produces exactly linear motion along x.
        let policy = crate::observations::TabulatedDistances(vec![1.0e6, 2.0e6, 3.0e6]);
        let state = determine_orbit(&obs, &policy, &StillEarth).unwrap();

        assert_relative_eq!(state.position_km.x, 2.0e6, max_relative = 1e-12);
        assert_relative_eq!(
            state.velocity_km_s.x,
            1.0e6 / 86_400.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(state.velocity_km_s.y, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_linear_fit_rejects_zero_spread() {
        assert!(linear_fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_none());
        let (intercept, slope) = linear_fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert_relative_eq!(intercept, 1.0);
        assert_relative_eq!(slope, 2.0);
    }
}
