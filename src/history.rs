use std::collections::VecDeque;
use std::sync::Mutex;

use http::Method;

use crate::options::RequestOptions;
use crate::util::lock_unpoisoned;

/// What was handed to the transport for one dispatch, after the prepare hook and the merge.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub method: Method,
    pub url: String,
    pub options: RequestOptions,
}

#[derive(Debug)]
pub(crate) struct History {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl History {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn record(&self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = lock_unpoisoned(&self.entries);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub(crate) fn snapshot(&self) -> Vec<HistoryEntry> {
        lock_unpoisoned(&self.entries).iter().cloned().collect()
    }

    pub(crate) fn with_last<R>(&self, read: impl FnOnce(&HistoryEntry) -> R) -> Option<R> {
        lock_unpoisoned(&self.entries).back().map(read)
    }

    pub(crate) fn len(&self) -> usize {
        lock_unpoisoned(&self.entries).len()
    }

    pub(crate) fn clear(&self) {
        lock_unpoisoned(&self.entries).clear();
    }
}
