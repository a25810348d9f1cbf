use std::collections::HashMap;

use super::record::AppsInstalled;

/// Records destined for exactly one shard
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    shard: String,
    records: Vec<AppsInstalled>,
}

impl Batch {
    pub fn new(shard: impl Into<String>, records: Vec<AppsInstalled>) -> Self {
        Self {
            shard: shard.into(),
            records,
        }
    }

    /// Shard address every record in this batch is routed to
    pub fn shard(&self) -> &str {
        &self.shard
    }

    pub fn records(&self) -> &[AppsInstalled] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Groups routed records per shard and emits size-bounded batches
///
/// Each shard keeps its own buffer. A buffer is flushed as soon as its
/// length strictly exceeds the threshold, so a full batch carries
/// `threshold + 1` records. Records for different shards never share a
/// batch.
#[derive(Debug)]
pub struct BatchAccumulator {
    threshold: usize,
    pending: HashMap<String, Vec<AppsInstalled>>,
    pending_count: usize,
}

impl BatchAccumulator {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            pending: HashMap::new(),
            pending_count: 0,
        }
    }

    /// Add a record routed to `shard`, returning a batch if the shard buffer overflowed
    pub fn push(&mut self, shard: &str, record: AppsInstalled) -> Option<Batch> {
        let buffer = match self.pending.get_mut(shard) {
            Some(buffer) => buffer,
            None => self.pending.entry(shard.to_string()).or_default(),
        };
        buffer.push(record);
        self.pending_count += 1;

        if buffer.len() > self.threshold {
            let records = std::mem::take(buffer);
            self.pending_count -= records.len();
            return Some(Batch::new(shard, records));
        }

        None
    }

    /// Number of records buffered but not yet emitted
    pub fn pending(&self) -> usize {
        self.pending_count
    }

    /// Flush every non-empty buffer, ordered by shard address
    pub fn finish(self) -> Vec<Batch> {
        let mut batches: Vec<Batch> = self
            .pending
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(shard, records)| Batch::new(shard, records))
            .collect();
        batches.sort_by(|a, b| a.shard.cmp(&b.shard));
        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(dev_type: &str, dev_id: &str) -> AppsInstalled {
        AppsInstalled {
            dev_type: dev_type.to_string(),
            dev_id: dev_id.to_string(),
            lat: None,
            lon: None,
            apps: vec![1],
        }
    }

    #[test]
    fn flushes_when_count_strictly_exceeds_threshold() {
        let mut acc = BatchAccumulator::new(3);

        for i in 0..3 {
            assert!(acc.push("a:1", record("idfa", &i.to_string())).is_none());
        }
        let batch = acc.push("a:1", record("idfa", "3")).expect("fourth record flushes");

        assert_eq!(batch.shard(), "a:1");
        assert_eq!(batch.len(), 4);
        assert_eq!(acc.pending(), 0);
    }

    #[test]
    fn zero_threshold_emits_single_record_batches() {
        let mut acc = BatchAccumulator::new(0);
        let batch = acc.push("a:1", record("idfa", "1")).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn never_mixes_shards_in_one_batch() {
        let mut acc = BatchAccumulator::new(1);
        let mut emitted = Vec::new();

        emitted.extend(acc.push("a:1", record("idfa", "1")));
        emitted.extend(acc.push("b:1", record("gaid", "2")));
        emitted.extend(acc.push("a:1", record("idfa", "3")));
        emitted.extend(acc.push("b:1", record("gaid", "4")));

        assert_eq!(emitted.len(), 2);
        for batch in &emitted {
            let expected = if batch.shard() == "a:1" { "idfa" } else { "gaid" };
            assert!(batch.records().iter().all(|r| r.dev_type == expected));
        }
    }

    #[test]
    fn finish_flushes_remainders_per_shard() {
        let mut acc = BatchAccumulator::new(10);
        acc.push("b:1", record("gaid", "1"));
        acc.push("a:1", record("idfa", "2"));
        acc.push("a:1", record("idfa", "3"));

        let batches = acc.finish();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].shard(), "a:1");
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].shard(), "b:1");
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn finish_on_empty_accumulator_emits_nothing() {
        assert!(BatchAccumulator::new(3).finish().is_empty());
    }

    #[test]
    fn preserves_record_order_within_shard() {
        let mut acc = BatchAccumulator::new(2);
        acc.push("a:1", record("idfa", "1"));
        acc.push("a:1", record("idfa", "2"));
        let batch = acc.push("a:1", record("idfa", "3")).unwrap();

        let ids: Vec<_> = batch.records().iter().map(|r| r.dev_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    proptest! {
        #[test]
        fn emitted_records_equal_pushed_records(
            shards in proptest::collection::vec(0usize..4, 0..200),
            threshold in 0usize..10,
        ) {
            let mut acc = BatchAccumulator::new(threshold);
            let mut emitted = 0usize;

            for (i, shard) in shards.iter().enumerate() {
                let addr = format!("shard-{shard}");
                if let Some(batch) = acc.push(&addr, record("idfa", &i.to_string())) {
                    prop_assert!(batch.len() == threshold + 1);
                    emitted += batch.len();
                }
            }
            for batch in acc.finish() {
                prop_assert!(!batch.is_empty());
                prop_assert!(batch.len() <= threshold);
                emitted += batch.len();
            }

            prop_assert_eq!(emitted, shards.len());
        }
    }
}
