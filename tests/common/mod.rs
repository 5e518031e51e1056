//! Shared helpers for the integration tests: synthetic observation arcs with
//! known ground truth.

use apparition::constants::{DPI, RADEG, RADH, SECONDS_PER_DAY};
use apparition::{
    BuiltinEarthEphemeris, Ephemeris, Kilometer, Observation, Observations, AU, SUN_MU,
};
use hifitime::{Duration, Epoch};
use nalgebra::Vector3;

/// Synthetic sightings of a body on a circular 1 AU heliocentric orbit.
///
/// The body moves in the equatorial plane of the fitting frame at the exact
/// two-body mean motion; RA/Dec are derived from the geocentric vector using
/// the same built-in Earth ephemeris the pipeline anchors against. Returns
/// the observation arc together with the true geocentric distances, so a
/// `TabulatedDistances` policy makes the directional estimates exact.
pub fn circular_arc(
    start: Epoch,
    phase_rad: f64,
    count: usize,
) -> (Observations, Vec<Kilometer>) {
    let earth = BuiltinEarthEphemeris;
    let mean_motion = (SUN_MU / AU.powi(3)).sqrt();

    let mut observations = Observations::new();
    let mut distances = Vec::with_capacity(count);

    for i in 0..count {
        let epoch = start + Duration::from_days(i as f64);
        let theta = phase_rad + mean_motion * i as f64 * SECONDS_PER_DAY;
        let body = Vector3::new(AU * theta.cos(), AU * theta.sin(), 0.0);

        let (earth_position, _) = earth.state(epoch);
        let geocentric = body - earth_position;
        let range = geocentric.norm();

        let ra_hours = geocentric.y.atan2(geocentric.x).rem_euclid(DPI) / RADH;
        let dec_degrees = (geocentric.z / range).asin() / RADEG;

        observations.push(
            Observation::new(i as u64 + 1, ra_hours, dec_degrees, epoch)
                .unwrap_or_else(|e| panic!("synthetic observation {i} invalid: {e}")),
        );
        distances.push(range);
    }

    (observations, distances)
}
