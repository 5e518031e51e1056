//! # Reference-body ephemeris
//!
//! The pipeline needs the position and velocity of Earth at arbitrary instants:
//! once per observation when anchoring line-of-sight vectors in the heliocentric
//! frame, and once per sampled offset of the closest-approach search.
//!
//! The [`Ephemeris`] trait keeps that dependency narrow — a pure function of
//! time, safe to call concurrently — while [`BuiltinEarthEphemeris`] provides a
//! self-contained analytic implementation from the JPL approximate mean elements
//! of the Earth–Moon barycenter (Standish, valid 1800–2050). Positions are
//! heliocentric equatorial J2000, in kilometers; velocities in km/s.

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::constants::{Kilometer, AU, OBLIQUITY_J2000, RADEG, SECONDS_PER_DAY, T2000};

/// Provider of the reference body's heliocentric state.
///
/// Implementations must be pure functions of the epoch (no side effects), so
/// the closest-approach search may evaluate them from multiple workers.
pub trait Ephemeris: Send + Sync {
    /// Heliocentric equatorial J2000 position (km) and velocity (km/s) of the
    /// reference body at `epoch`.
    fn state(&self, epoch: Epoch) -> (Vector3<Kilometer>, Vector3<f64>);
}

/// Analytic Earth ephemeris from the JPL approximate planetary elements.
///
/// Mean elements of the Earth–Moon barycenter are evaluated as linear
/// functions of centuries past J2000 (TT), Kepler's equation is solved by
/// Newton iteration, and the perifocal state is rotated to the ecliptic and
/// then to the equatorial J2000 frame. Velocity is obtained by a symmetric
/// finite difference over ±300 s, which keeps the provider a pure function
/// of time.
#[derive(Debug, Clone, Default)]
pub struct BuiltinEarthEphemeris;

/// Half-width of the finite-difference stencil used for velocities (seconds).
const VELOCITY_STENCIL_S: f64 = 300.0;

impl BuiltinEarthEphemeris {
    pub fn new() -> Self {
        BuiltinEarthEphemeris
    }

    /// Heliocentric equatorial J2000 position of the Earth–Moon barycenter.
    ///
    /// Arguments
    /// ---------
    /// * `mjd_tt`: epoch as Modified Julian Date in the TT time scale
    ///
    /// Return
    /// ------
    /// * position vector in kilometers
    fn position_km(&self, mjd_tt: f64) -> Vector3<Kilometer> {
        // Centuries past J2000.0 (TT)
        let t = (mjd_tt - T2000) / 36525.0;

        // JPL approximate elements for the EM barycenter, 1800-2050 AD
        let a = 1.000_002_61 + 0.000_005_62 * t; // AU
        let e = 0.016_711_23 - 0.000_043_92 * t;
        let inc = (-0.000_015_31 - 0.012_946_68 * t) * RADEG;
        let mean_lon = (100.464_571_66 + 35_999.372_449_81 * t) * RADEG;
        let lon_peri = (102.937_681_93 + 0.323_273_64 * t) * RADEG;
        let lon_node = 0.0;

        let mean_anomaly = (mean_lon - lon_peri).rem_euclid(crate::constants::DPI);

        // Kepler's equation, Newton iteration. Earth's eccentricity is tiny,
        // convergence takes a handful of steps.
        let mut ecc_anomaly = mean_anomaly;
        for _ in 0..50 {
            let delta = (mean_anomaly - (ecc_anomaly - e * ecc_anomaly.sin()))
                / (1.0 - e * ecc_anomaly.cos());
            ecc_anomaly += delta;
            if delta.abs() < 1e-14 {
                break;
            }
        }

        // Perifocal coordinates
        let x_peri = a * (ecc_anomaly.cos() - e);
        let y_peri = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();

        // Perifocal -> ecliptic J2000
        let argp = lon_peri - lon_node;
        let (sin_w, cos_w) = argp.sin_cos();
        let (sin_o, cos_o) = f64::sin_cos(lon_node);
        let (sin_i, cos_i) = inc.sin_cos();

        let x_ecl = (cos_w * cos_o - sin_w * sin_o * cos_i) * x_peri
            + (-sin_w * cos_o - cos_w * sin_o * cos_i) * y_peri;
        let y_ecl = (cos_w * sin_o + sin_w * cos_o * cos_i) * x_peri
            + (-sin_w * sin_o + cos_w * cos_o * cos_i) * y_peri;
        let z_ecl = (sin_w * sin_i) * x_peri + (cos_w * sin_i) * y_peri;

        // Ecliptic -> equatorial J2000 (rotation about x by the mean obliquity)
        let (sin_eps, cos_eps) = OBLIQUITY_J2000.sin_cos();
        Vector3::new(
            x_ecl * AU,
            (y_ecl * cos_eps - z_ecl * sin_eps) * AU,
            (y_ecl * sin_eps + z_ecl * cos_eps) * AU,
        )
    }
}

impl Ephemeris for BuiltinEarthEphemeris {
    fn state(&self, epoch: Epoch) -> (Vector3<Kilometer>, Vector3<f64>) {
        let mjd_tt = epoch.to_mjd_tt_days();
        let position = self.position_km(mjd_tt);

        let h_days = VELOCITY_STENCIL_S / SECONDS_PER_DAY;
        let ahead = self.position_km(mjd_tt + h_days);
        let behind = self.position_km(mjd_tt - h_days);
        let velocity = (ahead - behind) / (2.0 * VELOCITY_STENCIL_S);

        (position, velocity)
    }
}
