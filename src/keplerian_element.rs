//! # Classical orbital elements
//!
//! [`OrbitalElements`] is the serializable, reportable view of a fitted
//! [`StateVector`](crate::state_vector::StateVector): size, shape, and
//! orientation of the Keplerian orbit plus the time of periapsis passage.
//! The conversion is the standard chain of two-body relations — specific
//! angular momentum, node vector, eccentricity (Laplace–Runge–Lenz) vector,
//! vis-viva — with quadrant disambiguation taken from vector signs rather
//! than bare `acos`. Degenerate circular/equatorial geometry resolves the
//! undefined angles to a deterministic 0.0 sentinel; nothing in this module
//! is randomized.
//!
//! The conversion only represents bound ellipses. Hyperbolic or parabolic
//! fits surface [`ApparitionError::NonEllipticalOrbit`]; the state vector
//! itself stays valid for propagation, which never re-derives from elements.

use hifitime::{Duration, Epoch};
use nalgebra::Vector3;
use serde::Serialize;
use std::fmt;

use crate::apparition_errors::ApparitionError;
use crate::constants::{Degree, AU, DPI, RADEG};
use crate::state_vector::StateVector;

/// Threshold below which eccentricity / node-vector magnitudes are treated
/// as degenerate (circular or equatorial orbit).
const DEGENERACY_EPS: f64 = 1e-11;

/// Classical orbital elements of a bound heliocentric orbit.
///
/// Units:
/// * `semi_major_axis_au`: AU (astronomical units)
/// * `eccentricity`: unitless, in [0, 1)
/// * `inclination_deg`: degrees, [0, 180]
/// * `raan_deg`: degrees, [0, 360)
/// * `arg_periapsis_deg`: degrees, [0, 360)
/// * `periapsis_time`: UTC instant of the most recent periapsis passage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalElements {
    pub semi_major_axis_au: f64,
    pub eccentricity: f64,
    pub inclination_deg: Degree,
    pub raan_deg: Degree,
    pub arg_periapsis_deg: Degree,
    pub periapsis_time: Epoch,
}

impl fmt::Display for OrbitalElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "a    = {:.6} AU", self.semi_major_axis_au)?;
        writeln!(f, "e    = {:.6}", self.eccentricity)?;
        writeln!(f, "i    = {:.4}°", self.inclination_deg)?;
        writeln!(f, "Ω    = {:.4}°", self.raan_deg)?;
        writeln!(f, "ω    = {:.4}°", self.arg_periapsis_deg)?;
        write!(f, "Tp   = {}", self.periapsis_time)
    }
}

impl TryFrom<&StateVector> for OrbitalElements {
    type Error = ApparitionError;

    /// Map a state vector to classical elements via the standard two-body
    /// relations.
    ///
    /// Fails with [`ApparitionError::NonEllipticalOrbit`] when the specific
    /// energy is non-negative or the eccentricity reaches 1: the reporting
    /// path cannot represent an unbound fit, even though propagation of the
    /// state itself remains possible.
    fn try_from(state: &StateVector) -> Result<Self, Self::Error> {
        let r = state.position_km;
        let v = state.velocity_km_s;
        let mu = state.mu_km3_s2;

        let rm = r.norm();
        let v2 = v.dot(&v);

        // Specific angular momentum and node vector (ẑ × h)
        let h = r.cross(&v);
        let hm = h.norm();
        let n = Vector3::new(-h.y, h.x, 0.0);
        let nm = n.norm();

        // Eccentricity vector, pointing at periapsis
        let e_vec = v.cross(&h) / mu - r / rm;
        let eccentricity = e_vec.norm();

        // Vis-viva: a = -mu / 2E
        let energy = v2 / 2.0 - mu / rm;
        let semi_major_axis_km = -mu / (2.0 * energy);

        if semi_major_axis_km <= 0.0 || eccentricity >= 1.0 {
            return Err(ApparitionError::NonEllipticalOrbit {
                semi_major_axis_au: semi_major_axis_km / AU,
                eccentricity,
            });
        }

        let inclination = (h.z / hm).clamp(-1.0, 1.0).acos();

        let equatorial = nm <= DEGENERACY_EPS * hm;
        let circular = eccentricity <= DEGENERACY_EPS;

        // RAAN from the node vector; sentinel 0.0 when the orbit lies in the
        // equatorial plane and the node is undefined.
        let raan = if equatorial {
            0.0
        } else {
            let mut raan = (n.x / nm).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 {
                raan = DPI - raan;
            }
            raan
        };

        // Argument of periapsis, half-plane resolved by the sign of e_z.
        let arg_periapsis = if circular {
            0.0
        } else if equatorial {
            // Longitude of periapsis measured from +x in the orbit plane.
            e_vec.y.atan2(e_vec.x).rem_euclid(DPI)
        } else {
            let mut argp = (n.dot(&e_vec) / (nm * eccentricity))
                .clamp(-1.0, 1.0)
                .acos();
            if e_vec.z < 0.0 {
                argp = DPI - argp;
            }
            argp
        };

        // True anomaly at the epoch, measured from periapsis (or from the
        // reference direction when periapsis is undefined).
        let true_anomaly = if circular {
            let reference = if equatorial {
                Vector3::new(1.0, 0.0, 0.0)
            } else {
                n / nm
            };
            let mut nu = (reference.dot(&r) / rm).clamp(-1.0, 1.0).acos();
            // r·v vanishes on a circle; the half-plane comes from geometry.
            let below = if equatorial { r.y < 0.0 } else { r.z < 0.0 };
            if below {
                nu = DPI - nu;
            }
            nu
        } else {
            let mut nu = (e_vec.dot(&r) / (eccentricity * rm))
                .clamp(-1.0, 1.0)
                .acos();
            if r.dot(&v) < 0.0 {
                nu = DPI - nu;
            }
            nu
        };

        // True -> eccentric -> mean anomaly, then back along the mean motion
        // to the most recent periapsis passage.
        let ecc_anomaly = 2.0
            * ((1.0 - eccentricity).sqrt() * (true_anomaly / 2.0).sin())
                .atan2((1.0 + eccentricity).sqrt() * (true_anomaly / 2.0).cos());
        let mean_anomaly = (ecc_anomaly - eccentricity * ecc_anomaly.sin()).rem_euclid(DPI);
        let mean_motion = (mu / semi_major_axis_km.powi(3)).sqrt();
        let periapsis_time = state.epoch + Duration::from_seconds(-mean_anomaly / mean_motion);

        Ok(OrbitalElements {
            semi_major_axis_au: semi_major_axis_km / AU,
            eccentricity,
            inclination_deg: inclination / RADEG,
            raan_deg: raan / RADEG,
            arg_periapsis_deg: arg_periapsis / RADEG,
            periapsis_time,
        })
    }
}
