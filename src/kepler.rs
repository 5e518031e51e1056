//! # Two-body propagation kernel
//!
//! Analytic propagation solves the universal-variable form of Kepler's
//! equation (Stumpff series, Newton iteration) and rebuilds the state through
//! the Lagrange f/g coefficients. Near-singular solves can fail to converge
//! for specific offsets while neighboring offsets succeed, so
//! [`propagate_with_ladder`] retries each call through an ordered list of
//! strategies: the default tolerance, three progressively looser tolerances,
//! and finally a direct Cowell-style RK4 integration of the equations of
//! motion. Each attempt is independent and stateless.

use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::apparition_errors::ApparitionError;
use crate::constants::{Kilometer, SECONDS_PER_DAY};

/// Convergence tolerance of the first analytic attempt.
const DEFAULT_TOLERANCE: f64 = 1e-11;

/// Looser tolerances tried in order when the default attempt fails.
const FALLBACK_TOLERANCES: [f64; 3] = [1e-9, 1e-7, 1e-5];

/// Newton iteration cap for the universal Kepler solve.
const MAX_NEWTON_ITERATIONS: usize = 60;

/// Maximum RK4 step of the Cowell fallback, in seconds.
const COWELL_MAX_STEP_S: f64 = 3_600.0;

/// Stumpff functions C(z) and S(z).
///
/// Series expansions are used near z = 0 where the closed forms lose
/// precision to cancellation.
fn stumpff(z: f64) -> (f64, f64) {
    if z > 1e-8 {
        let sz = z.sqrt();
        ((1.0 - sz.cos()) / z, (sz - sz.sin()) / (sz * z))
    } else if z < -1e-8 {
        let sz = (-z).sqrt();
        ((sz.cosh() - 1.0) / -z, (sz.sinh() - sz) / (sz * -z))
    } else {
        (0.5 - z / 24.0, 1.0 / 6.0 - z / 120.0)
    }
}

/// One analytic propagation attempt at a given tolerance.
///
/// Solves the universal Kepler equation for the bound (elliptic) domain and
/// reconstructs position and velocity with the Lagrange coefficients. Returns
/// `None` when the orbit is not a bound ellipse, when Newton iteration does
/// not converge at the requested tolerance, or when the f/g consistency check
/// fails.
fn kepler_universal(
    position: &Vector3<Kilometer>,
    velocity: &Vector3<f64>,
    mu: f64,
    dt: f64,
    tolerance: f64,
) -> Option<(Vector3<Kilometer>, Vector3<f64>)> {
    if dt == 0.0 {
        return Some((*position, *velocity));
    }

    let r0m = position.norm();
    if r0m == 0.0 {
        return None;
    }
    let radial_rate = position.dot(velocity) / r0m;
    // Reciprocal semi-major axis; positive for bound ellipses only.
    let alpha = 2.0 / r0m - velocity.dot(velocity) / mu;
    if !alpha.is_finite() || alpha <= 1e-12 {
        return None;
    }

    let sqrt_mu = mu.sqrt();
    let mut chi = sqrt_mu * alpha * dt;

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let z = alpha * chi * chi;
        let (c, s) = stumpff(z);

        let f = r0m * radial_rate / sqrt_mu * chi * chi * c
            + (1.0 - alpha * r0m) * chi.powi(3) * s
            + r0m * chi
            - sqrt_mu * dt;
        let df = r0m * radial_rate / sqrt_mu * chi * (1.0 - z * s)
            + (1.0 - alpha * r0m) * chi * chi * c
            + r0m;

        let dchi = f / df;
        if !dchi.is_finite() {
            return None;
        }
        chi -= dchi;

        if dchi.abs() < tolerance * chi.abs().max(1.0) {
            let z = alpha * chi * chi;
            let (c, s) = stumpff(z);

            let lag_f = 1.0 - chi * chi * c / r0m;
            let lag_g = dt - chi.powi(3) * s / sqrt_mu;
            let new_position = position * lag_f + velocity * lag_g;
            let rm = new_position.norm();

            let lag_fdot = sqrt_mu / (rm * r0m) * (z * s - 1.0) * chi;
            let lag_gdot = 1.0 - chi * chi * c / rm;
            let new_velocity = position * lag_fdot + velocity * lag_gdot;

            // Conservation of the f/g determinant; a violation flags a
            // spurious Newton fixed point.
            if (lag_f * lag_gdot - lag_fdot * lag_g - 1.0).abs() > 1e-6 {
                return None;
            }
            if !(new_position.iter().all(|x| x.is_finite())
                && new_velocity.iter().all(|x| x.is_finite()))
            {
                return None;
            }
            return Some((new_position, new_velocity));
        }
    }

    None
}

/// Two-body acceleration, r̈ = -μ r / |r|³.
fn two_body_acceleration(position: &Vector3<Kilometer>, mu: f64) -> Vector3<f64> {
    let rm = position.norm();
    position * (-mu / (rm * rm * rm))
}

/// Cowell-style fallback: fixed-step RK4 integration of the equations of
/// motion. Slower and less accurate than the analytic solve, but immune to
/// the Kepler equation's convergence pathologies.
fn cowell_rk4(
    position: &Vector3<Kilometer>,
    velocity: &Vector3<f64>,
    mu: f64,
    dt: f64,
) -> Option<(Vector3<Kilometer>, Vector3<f64>)> {
    if dt == 0.0 {
        return Some((*position, *velocity));
    }

    let steps = (dt.abs() / COWELL_MAX_STEP_S).ceil().max(1.0) as usize;
    let h = dt / steps as f64;

    let mut r = *position;
    let mut v = *velocity;
    for _ in 0..steps {
        let k1v = two_body_acceleration(&r, mu);
        let k1r = v;
        let k2v = two_body_acceleration(&(r + k1r * (h / 2.0)), mu);
        let k2r = v + k1v * (h / 2.0);
        let k3v = two_body_acceleration(&(r + k2r * (h / 2.0)), mu);
        let k3r = v + k2v * (h / 2.0);
        let k4v = two_body_acceleration(&(r + k3r * h), mu);
        let k4r = v + k3v * h;

        r += (k1r + k2r * 2.0 + k3r * 2.0 + k4r) * (h / 6.0);
        v += (k1v + k2v * 2.0 + k3v * 2.0 + k4v) * (h / 6.0);
    }

    if r.iter().all(|x| x.is_finite()) && v.iter().all(|x| x.is_finite()) {
        Some((r, v))
    } else {
        None
    }
}

/// Propagate a Cartesian state by `dt` seconds through the fallback ladder.
///
/// Attempt order: default tolerance, then each of [`FALLBACK_TOLERANCES`],
/// then the Cowell integration. The first success wins; exhaustion of all
/// strategies yields [`ApparitionError::PropagationFailed`] for this single
/// offset, which the closest-approach search treats as a skippable sample.
pub(crate) fn propagate_with_ladder(
    position: &Vector3<Kilometer>,
    velocity: &Vector3<f64>,
    mu: f64,
    dt: f64,
) -> Result<(Vector3<Kilometer>, Vector3<f64>), ApparitionError> {
    if let Some(state) = kepler_universal(position, velocity, mu, dt, DEFAULT_TOLERANCE) {
        return Ok(state);
    }

    for tolerance in FALLBACK_TOLERANCES {
        if let Some(state) = kepler_universal(position, velocity, mu, dt, tolerance) {
            debug!(
                offset_days = dt / SECONDS_PER_DAY,
                tolerance, "kepler solve succeeded at loosened tolerance"
            );
            return Ok(state);
        }
    }

    if let Some(state) = cowell_rk4(position, velocity, mu, dt) {
        warn!(
            offset_days = dt / SECONDS_PER_DAY,
            "analytic kepler solve failed, cowell integration used"
        );
        return Ok(state);
    }

    Err(ApparitionError::PropagationFailed {
        offset_days: dt / SECONDS_PER_DAY,
    })
}
