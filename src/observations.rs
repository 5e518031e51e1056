//! # Observations and directional vectors
//!
//! An [`Observation`] is one angular sighting: right ascension in hours,
//! declination in degrees, a UTC epoch, and the identifier assigned by the
//! persistence layer that owns the rows. The core only ever reads an ordered
//! sequence of them.
//!
//! Because a single sighting constrains direction but not range, each
//! observation is promoted to a [`DirectionalEstimate`] by scaling its unit
//! line-of-sight vector with an *assumed* distance and anchoring it at Earth's
//! heliocentric position for that epoch. The assumed distance comes from an
//! injectable [`DistancePolicy`]; the shipped [`LinearRamp`] is the stock
//! heuristic (0.8 AU base, 0.02 AU per index), and
//! [`TabulatedDistances`] lets callers substitute externally derived ranges
//! (e.g. a parallax solution) without touching the rest of the pipeline.

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::apparition_errors::ApparitionError;
use crate::constants::{Degree, Hour, Kilometer, AU, RADEG, RADH};
use crate::ephemeris::Ephemeris;

/// One angular sighting of the tracked body.
///
/// # Fields
///
/// * `id` - identifier of the stored observation row
/// * `ra` - right ascension in hours, [0, 24)
/// * `dec` - declination in degrees, [-90, 90]
/// * `epoch` - UTC instant of the sighting
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: crate::constants::ObservationId,
    pub ra: Hour,
    pub dec: Degree,
    pub epoch: Epoch,
}

impl Observation {
    /// Create a new observation, validating the angular domains.
    ///
    /// Arguments
    /// ---------
    /// * `id`: identifier of the stored observation row
    /// * `ra`: right ascension in hours, [0, 24)
    /// * `dec`: declination in degrees, [-90, 90]
    /// * `epoch`: UTC instant of the sighting
    ///
    /// Return
    /// ------
    /// * the observation, or [`ApparitionError::InvalidAngle`] if RA/Dec fall
    ///   outside their domains
    pub fn new(
        id: crate::constants::ObservationId,
        ra: Hour,
        dec: Degree,
        epoch: Epoch,
    ) -> Result<Self, ApparitionError> {
        validate_angles(ra, dec)?;
        Ok(Observation { id, ra, dec, epoch })
    }
}

fn validate_angles(ra: Hour, dec: Degree) -> Result<(), ApparitionError> {
    if !ra.is_finite() || !(0.0..24.0).contains(&ra) {
        return Err(ApparitionError::InvalidAngle(format!(
            "right ascension {ra} h outside [0, 24)"
        )));
    }
    if !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
        return Err(ApparitionError::InvalidAngle(format!(
            "declination {dec}° outside [-90, 90]"
        )));
    }
    Ok(())
}

/// Unit line-of-sight vector in the equatorial J2000 frame.
///
/// RA is converted from hours and Dec from degrees before the standard
/// spherical-to-Cartesian conversion. The domains are re-checked here: they
/// should already be rejected upstream, but the core does not trust callers.
pub fn line_of_sight(ra: Hour, dec: Degree) -> Result<Vector3<f64>, ApparitionError> {
    validate_angles(ra, dec)?;
    let ra_rad = ra * RADH;
    let dec_rad = dec * RADEG;
    let (sin_d, cos_d) = dec_rad.sin_cos();
    let (sin_a, cos_a) = ra_rad.sin_cos();
    Ok(Vector3::new(cos_d * cos_a, cos_d * sin_a, sin_d))
}

/// An observation promoted to an assumed 3D position in the heliocentric frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalEstimate {
    pub position_km: Vector3<Kilometer>,
    pub epoch: Epoch,
}

impl DirectionalEstimate {
    /// Build the estimate for one observation and one assumed distance.
    ///
    /// The line-of-sight unit vector is scaled by `distance_km` (giving a
    /// geocentric position) and anchored at Earth's heliocentric position for
    /// the observation epoch.
    pub fn from_observation(
        obs: &Observation,
        distance_km: Kilometer,
        ephemeris: &dyn Ephemeris,
    ) -> Result<Self, ApparitionError> {
        let los = line_of_sight(obs.ra, obs.dec)?;
        let (earth_position, _) = ephemeris.state(obs.epoch);
        Ok(DirectionalEstimate {
            position_km: earth_position + los * distance_km,
            epoch: obs.epoch,
        })
    }
}

/// Assumed geocentric distance for the observation at a given index.
///
/// This is a modeling simplification, not solved physics: the pipeline never
/// determines range from the observations themselves. Keeping the heuristic
/// behind a trait lets it be swapped for a real parallax-based solver without
/// touching the estimator.
pub trait DistancePolicy: Send + Sync {
    fn assumed_distance_km(&self, index: usize) -> Kilometer;
}

/// The stock heuristic: a monotonic ramp `base + step * index`, in AU.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRamp {
    pub base_au: f64,
    pub step_au: f64,
}

impl Default for LinearRamp {
    fn default() -> Self {
        LinearRamp {
            base_au: 0.8,
            step_au: 0.02,
        }
    }
}

impl DistancePolicy for LinearRamp {
    fn assumed_distance_km(&self, index: usize) -> Kilometer {
        (self.base_au + self.step_au * index as f64) * AU
    }
}

/// Distances supplied per index, in kilometers.
///
/// Indices past the end of the table repeat the last entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedDistances(pub Vec<Kilometer>);

impl DistancePolicy for TabulatedDistances {
    fn assumed_distance_km(&self, index: usize) -> Kilometer {
        let last = self.0.len().saturating_sub(1);
        self.0[index.min(last)]
    }
}

#[cfg(test)]
mod observations_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_of_sight_cardinal_directions() {
        // RA 0h, Dec 0 -> +x
        let u = line_of_sight(0.0, 0.0).unwrap();
        assert_relative_eq!(u.x, 1.0, epsilon = 1e-15);
        assert_relative_eq!(u.y, 0.0, epsilon = 1e-15);

        // RA 6h, Dec 0 -> +y
        let u = line_of_sight(6.0, 0.0).unwrap();
        assert_relative_eq!(u.y, 1.0, epsilon = 1e-15);

        // Dec 90 -> +z regardless of RA
        let u = line_of_sight(13.7, 90.0).unwrap();
        assert_relative_eq!(u.z, 1.0, epsilon = 1e-15);

        // Always a unit vector
        let u = line_of_sight(10.25, 20.5).unwrap();
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_invalid_angles_rejected() {
        let epoch = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);

        assert!(matches!(
            Observation::new(1, 24.0, 0.0, epoch),
            Err(ApparitionError::InvalidAngle(_))
        ));
        assert!(matches!(
            Observation::new(1, -0.1, 0.0, epoch),
            Err(ApparitionError::InvalidAngle(_))
        ));
        assert!(matches!(
            Observation::new(1, 12.0, 90.5, epoch),
            Err(ApparitionError::InvalidAngle(_))
        ));
        assert!(matches!(
            line_of_sight(f64::NAN, 0.0),
            Err(ApparitionError::InvalidAngle(_))
        ));
        assert!(Observation::new(1, 0.0, -90.0, epoch).is_ok());
    }

    #[test]
    fn test_linear_ramp_is_monotonic() {
        let ramp = LinearRamp::default();
        assert_relative_eq!(ramp.assumed_distance_km(0), 0.8 * AU);
        assert_relative_eq!(ramp.assumed_distance_km(3), 0.86 * AU);
        for i in 1..10 {
            assert!(ramp.assumed_distance_km(i) > ramp.assumed_distance_km(i - 1));
        }
    }

    #[test]
    fn test_tabulated_distances_clamps_to_last() {
        let table = TabulatedDistances(vec![1.0e8, 1.1e8, 1.2e8]);
        assert_eq!(table.assumed_distance_km(1), 1.1e8);
        assert_eq!(table.assumed_distance_km(7), 1.2e8);
    }

    #[test]
    fn test_directional_estimate_magnitude() {
        struct SunCentered;
        impl Ephemeris for SunCentered {
            fn state(&self, _epoch: Epoch) -> (Vector3<f64>, Vector3<f64>) {
                (Vector3::zeros(), Vector3::zeros())
            }
        }

        let epoch = Epoch::from_gregorian_utc(2023, 6, 30, 0, 0, 0, 0);
        let obs = Observation::new(1, 10.0, 20.0, epoch).unwrap();
        let est = DirectionalEstimate::from_observation(&obs, 0.8 * AU, &SunCentered).unwrap();

        // With the reference body at the origin, the magnitude is exactly the
        // assumed distance.
        assert_relative_eq!(est.position_km.norm(), 0.8 * AU, max_relative = 1e-12);
        assert_eq!(est.epoch, epoch);
    }
}
