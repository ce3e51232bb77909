//! Short-lived highlight ("pulse") on a clicked shape, reverted after a delay.

use std::time::{Duration, Instant};

use crate::model::{DocumentKind, FeatureRef};

pub const DEFAULT_PULSE: Duration = Duration::from_millis(220);

/// A shape as it was addressed when the pulse started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PulseTarget {
    pub kind: DocumentKind,
    pub generation: u64,
    pub feature: FeatureRef,
}

#[derive(Clone, Debug)]
pub struct PulseScheduler {
    duration: Duration,
    pending: Vec<(PulseTarget, Instant)>,
}

impl Default for PulseScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PULSE)
    }
}

impl PulseScheduler {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            pending: Vec::new(),
        }
    }

    /// Starts a pulse, restarting it if the target is already pulsing.
    pub fn schedule(&mut self, target: PulseTarget, now: Instant) {
        self.pending.retain(|(t, _)| *t != target);
        self.pending.push((target, now + self.duration));
    }

    pub fn is_pulsing(&self, target: &PulseTarget, now: Instant) -> bool {
        self.pending
            .iter()
            .any(|(t, due)| t == target && *due > now)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, due)| *due).min()
    }

    /// Reverts every pulse whose time has come. Targets for which `is_live`
    /// says no are dropped without being reported.
    pub fn fire_due(
        &mut self,
        now: Instant,
        is_live: impl Fn(&PulseTarget) -> bool,
    ) -> Vec<PulseTarget> {
        let (due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(_, at)| *at <= now);
        self.pending = pending;
        due.into_iter()
            .map(|(target, _)| target)
            .filter(|target| {
                let live = is_live(target);
                if !live {
                    log::debug!("pulse target {target:?} is gone");
                }
                live
            })
            .collect()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Feature, FeatureCollection, Point, Shape};

    fn refs(n: usize) -> (FeatureCollection, Vec<FeatureRef>) {
        let mut c = FeatureCollection::new();
        let refs = (0..n)
            .map(|i| {
                c.append(Feature::new(
                    format!("L-{i}"),
                    Shape::circle(Point::new(0.0, 0.0), 1.0),
                    Attributes::new(),
                ))
            })
            .collect();
        (c, refs)
    }

    fn target(feature: FeatureRef, generation: u64) -> PulseTarget {
        PulseTarget {
            kind: DocumentKind::Lots,
            generation,
            feature,
        }
    }

    #[test]
    fn pulse_reverts_after_duration() {
        let (_, r) = refs(1);
        let t0 = Instant::now();
        let mut pulses = PulseScheduler::default();
        pulses.schedule(target(r[0], 1), t0);
        assert!(pulses.is_pulsing(&target(r[0], 1), t0 + Duration::from_millis(100)));
        assert!(pulses.fire_due(t0 + Duration::from_millis(100), |_| true).is_empty());
        let fired = pulses.fire_due(t0 + DEFAULT_PULSE, |_| true);
        assert_eq!(fired, vec![target(r[0], 1)]);
        assert!(pulses.is_idle());
    }

    #[test]
    fn rescheduling_restarts_the_pulse() {
        let (_, r) = refs(1);
        let t0 = Instant::now();
        let mut pulses = PulseScheduler::new(Duration::from_millis(200));
        pulses.schedule(target(r[0], 1), t0);
        pulses.schedule(target(r[0], 1), t0 + Duration::from_millis(150));
        assert!(pulses.fire_due(t0 + Duration::from_millis(250), |_| true).is_empty());
        assert_eq!(pulses.next_due(), Some(t0 + Duration::from_millis(350)));
    }

    #[test]
    fn dead_targets_are_dropped_silently() {
        let (c, r) = refs(2);
        let t0 = Instant::now();
        let mut pulses = PulseScheduler::default();
        pulses.schedule(target(r[1], 1), t0);
        pulses.schedule(target(r[0], 2), t0);

        // The collection was replaced (generation 2) by a smaller one.
        let (smaller, _) = refs(1);
        let current_generation = 2;
        let fired = pulses.fire_due(t0 + DEFAULT_PULSE, |t| {
            t.generation == current_generation && smaller.contains(t.feature)
        });
        assert_eq!(fired, vec![target(r[0], 2)]);
        assert!(c.contains(r[1]));
        assert!(pulses.is_idle());
    }
}
