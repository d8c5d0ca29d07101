use std::collections::HashMap;

use crate::format::{LabelSet, LogEntry};

/// Entries sharing one label set, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub labels: LabelSet,
    pub entries: Vec<LogEntry>,
}

/// Root of one Loki push request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushBatch {
    pub streams: Vec<Stream>,
}

impl PushBatch {
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.streams.iter().map(|s| s.entries.len()).sum()
    }
}

/// Group formatted entries into streams keyed by label set.
///
/// Streams appear in the order their label set was first seen; entries keep
/// their arrival order within a stream (Loki sorts by timestamp itself).
pub fn batch<I>(entries: I) -> PushBatch
where
    I: IntoIterator<Item = (LogEntry, LabelSet)>,
{
    let mut streams: Vec<Stream> = Vec::new();
    let mut index: HashMap<LabelSet, usize> = HashMap::new();

    for (entry, labels) in entries {
        match index.get(&labels) {
            Some(&i) => streams[i].entries.push(entry),
            None => {
                index.insert(labels.clone(), streams.len());
                streams.push(Stream {
                    labels,
                    entries: vec![entry],
                });
            }
        }
    }

    PushBatch { streams }
}
