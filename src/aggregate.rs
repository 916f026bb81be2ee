use crate::models::{AggregateDataset, Partitioned};

/// Stacks per-source partitions in the order given. No deduplication or reordering.
pub fn aggregate<I>(batches: I) -> AggregateDataset
where
    I: IntoIterator<Item = Partitioned>,
{
    let mut dataset = AggregateDataset::default();
    for batch in batches {
        dataset.scheduled.extend(batch.scheduled);
        dataset.unscheduled.extend(batch.unscheduled);
    }
    dataset
}
