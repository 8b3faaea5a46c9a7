use std::collections::BTreeMap;

/// Optional observer for viewer activity.
///
/// Viewers hold an `Option<Box<dyn Instrumentation>>`; nothing in the
/// rendering path depends on it being present.
pub trait Instrumentation {
    fn count(&mut self, name: &'static str, by: u64);
    fn observe(&mut self, name: &'static str, value: i64);
}

/// Running summary of observed values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Summary {
    fn record(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// In-memory [`Instrumentation`] sink.
///
/// Keys are kept in sorted maps so reports list metrics in a stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    summaries: BTreeMap<&'static str, Summary>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.counters.clear();
        self.summaries.clear();
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn summary(&self, name: &str) -> Option<Summary> {
        self.summaries.get(name).copied()
    }

    /// One `name value` line per counter, then one `name count/min/max` line per summary.
    pub fn report(&self) -> Vec<String> {
        let counters = self.counters.iter().map(|(k, v)| format!("{k} {v}"));
        let summaries = self
            .summaries
            .iter()
            .map(|(k, s)| format!("{k} {}/{}/{}", s.count, s.min, s.max));
        counters.chain(summaries).collect()
    }
}

impl Instrumentation for Metrics {
    fn count(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    fn observe(&mut self, name: &'static str, value: i64) {
        self.summaries.entry(name).or_default().record(value);
    }
}

#[cfg(test)]
mod tests {
    use super::{Instrumentation, Metrics};

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.count("viewer.paints", 1);
        m.count("viewer.paints", 2);
        assert_eq!(m.counter("viewer.paints"), 3);
        assert_eq!(m.counter("missing"), 0);
    }

    #[test]
    fn summaries_track_extremes() {
        let mut m = Metrics::new();
        for v in [5, -2, 7] {
            m.observe("viewer.points", v);
        }
        let s = m.summary("viewer.points").expect("observed");
        assert_eq!((s.count, s.sum, s.min, s.max), (3, 10, -2, 7));
        assert_eq!(m.summary("missing"), None);
    }

    #[test]
    fn works_behind_a_trait_object() {
        let mut m = Metrics::new();
        {
            let hook: &mut dyn Instrumentation = &mut m;
            hook.count("viewer.broadcasts", 1);
            hook.observe("viewer.points", 4);
        }
        assert_eq!(m.counter("viewer.broadcasts"), 1);
        assert_eq!(m.summary("viewer.points").and_then(|s| s.mean()), Some(4.0));
        m.reset();
        assert!(m.report().is_empty());
    }

    #[test]
    fn report_is_sorted() {
        let mut m = Metrics::new();
        m.count("viewer.relayouts", 1);
        m.count("viewer.paints", 2);
        m.observe("viewer.points", 5);
        assert_eq!(
            m.report(),
            vec![
                "viewer.paints 2".to_string(),
                "viewer.relayouts 1".to_string(),
                "viewer.points 1/5/5".to_string(),
            ]
        );
    }
}
