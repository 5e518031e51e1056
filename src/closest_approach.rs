//! # Closest-approach search
//!
//! Dense uniform sampling of the distance between the propagated body and the
//! reference body over a bounded future horizon. Each offset is evaluated
//! independently from the fitted state (propagation is stateless), so a
//! failed sample is logged and skipped rather than aborting the search, and
//! the loop can optionally fan out over a rayon pool (`parallel` feature)
//! with a deterministic minimum-reduction.
//!
//! Tie-break: offsets are compared strictly, in ascending order, so equal
//! minima resolve to the earliest time regardless of evaluation order.
//! Cancellation is checked between sample evaluations; stopping early never
//! corrupts the running minimum, and [`OnCancel`] selects whether the caller
//! gets the best-so-far or a [`ApparitionError::Cancelled`] failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hifitime::{Duration, Epoch};
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::apparition_errors::ApparitionError;
use crate::constants::{Kilometer, KmPerSec, SECONDS_PER_DAY};
use crate::ephemeris::Ephemeris;
use crate::state_vector::StateVector;

/// Minimum-distance event relative to the reference body.
///
/// Invariant: `distance_km` is the minimum over all successfully evaluated
/// samples, finite and non-negative, and `time` lies within
/// `[epoch, epoch + horizon]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosestApproachResult {
    pub time: Epoch,
    pub distance_km: Kilometer,
    pub relative_speed_km_s: KmPerSec,
}

impl fmt::Display for ClosestApproachResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closest approach at {}: {:.0} km, {:.3} km/s relative",
            self.time, self.distance_km, self.relative_speed_km_s
        )
    }
}

/// Behavior on caller-initiated cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnCancel {
    /// Fail the whole search with [`ApparitionError::Cancelled`].
    #[default]
    Fail,
    /// Return the running minimum as a partial result; fails with
    /// [`ApparitionError::Cancelled`] only when no sample succeeded yet.
    BestSoFar,
}

/// Shared flag the caller may raise to interrupt a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration of the sampling search.
///
/// `horizon` and `step` must both be strictly positive; the defaults are one
/// year of forward time at daily granularity.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub horizon: Duration,
    pub step: Duration,
    pub on_cancel: OnCancel,
    pub cancel: Option<CancelToken>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            horizon: Duration::from_days(365.0),
            step: Duration::from_days(1.0),
            on_cancel: OnCancel::default(),
            cancel: None,
        }
    }
}

/// One successfully evaluated sample.
struct Sample {
    index: usize,
    time: Epoch,
    distance_km: Kilometer,
    relative_speed_km_s: KmPerSec,
}

/// Propagate to one offset and measure separation from the reference body.
///
/// `None` when the fallback ladder is exhausted or the distance is not
/// finite; the caller treats both as a skipped sample.
fn evaluate_offset(
    state: &StateVector,
    ephemeris: &dyn Ephemeris,
    index: usize,
    offset_s: f64,
) -> Option<Sample> {
    let offset = Duration::from_seconds(offset_s);
    let propagated = match state.propagate(offset) {
        Ok(s) => s,
        Err(err) => {
            warn!(
                offset_days = offset_s / SECONDS_PER_DAY,
                %err,
                "skipping sample, propagation failed"
            );
            return None;
        }
    };

    let (earth_position, earth_velocity) = ephemeris.state(propagated.epoch);
    let distance_km = (propagated.position_km - earth_position).norm();
    if !distance_km.is_finite() {
        warn!(
            offset_days = offset_s / SECONDS_PER_DAY,
            "skipping sample, non-finite distance"
        );
        return None;
    }

    Some(Sample {
        index,
        time: propagated.epoch,
        distance_km,
        relative_speed_km_s: (propagated.velocity_km_s - earth_velocity).norm(),
    })
}

/// Merge a sample into the running minimum.
///
/// Strictly-less comparison with ascending indices as the secondary key
/// keeps the earliest time on ties, independent of evaluation order.
fn merge_minimum(best: &mut Option<Sample>, candidate: Sample) {
    match best {
        Some(current)
            if (candidate.distance_km, candidate.index)
                < (current.distance_km, current.index) =>
        {
            *best = Some(candidate);
        }
        None => *best = Some(candidate),
        _ => {}
    }
}

/// Search a bounded future window for the minimum-distance event.
///
/// Arguments
/// ---------
/// * `state`: the fitted state vector; sampling starts at its epoch
/// * `ephemeris`: reference-body provider, evaluated at each sampled instant
/// * `options`: horizon, sampling step, and cancellation policy
///
/// Return
/// ------
/// * the minimum-distance sample with its paired relative speed
///
/// Errors
/// ------
/// * [`ApparitionError::InvalidHorizon`] unless `horizon > 0` and `step > 0`
/// * [`ApparitionError::PropagationExhausted`] when every sample failed
/// * [`ApparitionError::Cancelled`] per the [`OnCancel`] policy
pub fn find_closest_approach(
    state: &StateVector,
    ephemeris: &dyn Ephemeris,
    options: &SearchOptions,
) -> Result<ClosestApproachResult, ApparitionError> {
    if options.horizon <= Duration::ZERO {
        return Err(ApparitionError::InvalidHorizon(options.horizon));
    }
    if options.step <= Duration::ZERO {
        return Err(ApparitionError::InvalidHorizon(options.step));
    }

    let horizon_s = options.horizon.to_seconds();
    let step_s = options.step.to_seconds();
    let samples = (horizon_s / step_s).ceil() as usize;
    // Offsets 0, step, ..., horizon (endpoint included, last step clamped).
    let offset_at = |k: usize| (k as f64 * step_s).min(horizon_s);

    let cancelled = || {
        options
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    };

    let mut best: Option<Sample> = None;
    let mut stopped_early = false;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let evaluated: Vec<Option<Sample>> = (0..=samples)
            .into_par_iter()
            .map(|k| {
                if cancelled() {
                    return None;
                }
                evaluate_offset(state, ephemeris, k, offset_at(k))
            })
            .collect();

        stopped_early = cancelled();
        for sample in evaluated.into_iter().flatten() {
            merge_minimum(&mut best, sample);
        }
    }

    #[cfg(not(feature = "parallel"))]
    for k in 0..=samples {
        if cancelled() {
            stopped_early = true;
            break;
        }
        if let Some(sample) = evaluate_offset(state, ephemeris, k, offset_at(k)) {
            merge_minimum(&mut best, sample);
        }
    }

    if stopped_early && options.on_cancel == OnCancel::Fail {
        return Err(ApparitionError::Cancelled);
    }

    match best {
        Some(sample) => Ok(ClosestApproachResult {
            time: sample.time,
            distance_km: sample.distance_km,
            relative_speed_km_s: sample.relative_speed_km_s,
        }),
        None if stopped_early => Err(ApparitionError::Cancelled),
        None => Err(ApparitionError::PropagationExhausted),
    }
}
