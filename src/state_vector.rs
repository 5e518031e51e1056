//! # Cartesian state vector
//!
//! A [`StateVector`] is the dynamical product of the estimator: heliocentric
//! position and velocity at an epoch, together with the central body's
//! gravitational parameter. It is created once per orbit-determination run and
//! immutable thereafter; propagation returns a fresh state at the shifted
//! epoch. Element conversion is a reporting-only view and never feeds back
//! into propagation.

use hifitime::{Duration, Epoch};
use nalgebra::Vector3;

use crate::apparition_errors::ApparitionError;
use crate::constants::Kilometer;
use crate::kepler::propagate_with_ladder;
use crate::keplerian_element::OrbitalElements;

/// Heliocentric position/velocity state at an epoch.
///
/// # Fields
///
/// * `position_km` - heliocentric equatorial J2000 position, km
/// * `velocity_km_s` - velocity in the same frame, km/s
/// * `epoch` - instant at which the state is valid
/// * `mu_km3_s2` - gravitational parameter of the central body, km³/s²
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    pub position_km: Vector3<Kilometer>,
    pub velocity_km_s: Vector3<f64>,
    pub epoch: Epoch,
    pub mu_km3_s2: f64,
}

impl StateVector {
    /// Distance from the central body, km.
    pub fn radius(&self) -> Kilometer {
        self.position_km.norm()
    }

    /// Speed relative to the central body, km/s.
    pub fn speed(&self) -> f64 {
        self.velocity_km_s.norm()
    }

    /// Advance the state by `offset` under unperturbed two-body motion.
    ///
    /// The analytic Kepler solve is retried through the fallback ladder (see
    /// [`crate::kepler`]); a zero offset returns the state unchanged.
    ///
    /// Arguments
    /// ---------
    /// * `offset`: signed time offset from this state's epoch
    ///
    /// Return
    /// ------
    /// * the propagated state at `epoch + offset`, or
    ///   [`ApparitionError::PropagationFailed`] once every ladder rung has
    ///   been exhausted for this offset
    pub fn propagate(&self, offset: Duration) -> Result<StateVector, ApparitionError> {
        let (position_km, velocity_km_s) = propagate_with_ladder(
            &self.position_km,
            &self.velocity_km_s,
            self.mu_km3_s2,
            offset.to_seconds(),
        )?;
        Ok(StateVector {
            position_km,
            velocity_km_s,
            epoch: self.epoch + offset,
            mu_km3_s2: self.mu_km3_s2,
        })
    }

    /// Classical orbital elements of this state (reporting-only view).
    pub fn to_elements(&self) -> Result<OrbitalElements, ApparitionError> {
        OrbitalElements::try_from(self)
    }
}
