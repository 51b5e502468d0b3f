use super::settings::TargetFilter;
use crate::imaging::Observation;
use std::cmp::Ordering;

/// Picks the landing target among the observations of one frame.
///
/// Only observations accepted by `filter` are eligible. Among those the
/// largest relative size wins (closest or most reliable marker). Ties are
/// broken by the lower marker id, then by the smaller center coordinates, so
/// the result does not depend on the order of `observations`.
pub fn select_target(observations: &[Observation], filter: TargetFilter) -> Option<&Observation> {
    observations
        .iter()
        .filter(|obs| filter.accepts(obs.marker_id()))
        .filter(|obs| obs.relative_size().is_finite())
        .max_by(|a, b| rank(a, b))
}

/// Total order in which the greater observation is the preferred target.
fn rank(a: &Observation, b: &Observation) -> Ordering {
    a.relative_size()
        .total_cmp(&b.relative_size())
        .then_with(|| b.marker_id().cmp(&a.marker_id()))
        .then_with(|| b.center_x().total_cmp(&a.center_x()))
        .then_with(|| b.center_y().total_cmp(&a.center_y()))
}
