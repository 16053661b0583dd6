//! Per-session accumulator of change descriptors.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Descriptors collected between two settle points.
///
/// Appends and drains take the same lock, so an entry appended concurrently
/// with a drain lands either in that drain or in the next one, never both.
#[derive(Debug, Default)]
pub(crate) struct EventLog {
    entries: Mutex<Vec<String>>,
}

impl EventLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, descriptor: impl Into<String>) {
        self.lock().push(descriptor.into());
    }

    /// Take every entry in arrival order, leaving the log empty.
    pub(crate) fn drain_all(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_returns_arrival_order_and_empties() {
        let log = EventLog::new();
        log.append("name=a.html@time=1");
        log.append("name=b.html@time=2");
        assert_eq!(log.len(), 2);

        assert_eq!(
            log.drain_all(),
            vec!["name=a.html@time=1", "name=b.html@time=2"]
        );
        assert_eq!(log.len(), 0);
        assert!(log.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_appends_and_drains_lose_nothing() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 500;

        let log = Arc::new(EventLog::new());

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        log.append(format!("{w}-{i}"));
                    }
                })
            })
            .collect();

        let drainer = {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                let mut drained = Vec::new();
                for _ in 0..200 {
                    drained.extend(log.drain_all());
                    thread::yield_now();
                }
                drained
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        let mut all = drainer.join().unwrap();
        all.extend(log.drain_all());

        assert_eq!(all.len(), WRITERS * PER_WRITER);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), WRITERS * PER_WRITER);
    }

    #[test]
    fn test_per_writer_order_is_preserved() {
        let log = Arc::new(EventLog::new());
        let writer = {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..100 {
                    log.append(i.to_string());
                }
            })
        };

        let mut all = Vec::new();
        while !writer.is_finished() {
            all.extend(log.drain_all());
        }
        writer.join().unwrap();
        all.extend(log.drain_all());

        let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(all, expected);
    }
}
