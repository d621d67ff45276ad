//! Scoring Pool
//!
//! Multi-threaded document scoring over a shared, read-only scorer.
//! Documents go out through a bounded crossbeam queue; results come back
//! tagged with their submission ticket and are released in input order.

use crossbeam::channel::{self, Receiver, Sender};
use std::collections::BTreeMap;
use std::thread;
use tracing::debug;

use super::document::{Document, ScoreRow};
use super::scorer::DocumentScorer;

/// Scoring pool configuration
#[derive(Debug, Clone)]
pub struct ScoringPoolConfig {
    /// Number of worker threads (0 = auto-detect)
    pub num_workers: usize,
    /// Whether to pin workers to CPU cores
    pub pin_to_cores: bool,
    /// Pending document queue capacity
    pub queue_capacity: usize,
}

impl Default for ScoringPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 0,
            pin_to_cores: false,
            queue_capacity: 1024,
        }
    }
}

impl ScoringPoolConfig {
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_pinning(mut self, pin: bool) -> Self {
        self.pin_to_cores = pin;
        self
    }

    /// Worker count after auto-detection
    pub fn resolved_workers(&self) -> usize {
        if self.num_workers == 0 {
            num_cpus::get()
        } else {
            self.num_workers
        }
    }
}

/// Work item sent to a scoring worker
struct WorkItem {
    ticket: u64,
    document: Document,
}

/// Parallel scorer that emits rows in submission order
#[derive(Debug, Clone, Default)]
pub struct ScoringPool {
    config: ScoringPoolConfig,
}

impl ScoringPool {
    pub fn new(config: ScoringPoolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringPoolConfig {
        &self.config
    }

    /// Score every document and hand rows to `sink` in input order.
    ///
    /// Workers only borrow the scorer, so no locking is involved. If `sink`
    /// fails, no further documents are queued and the error is returned once
    /// the workers have drained.
    pub fn run<I, F, E>(&self, scorer: DocumentScorer<'_>, documents: I, sink: F) -> Result<usize, E>
    where
        I: IntoIterator<Item = Document>,
        I::IntoIter: Send,
        F: FnMut(ScoreRow) -> Result<(), E>,
        E: Send,
    {
        self.try_run(scorer, documents.into_iter().map(Ok), sink)
    }

    /// Like [`run`](Self::run) for a fallible document source. Rows for
    /// documents read before a source error are still emitted.
    pub fn try_run<I, F, E>(&self, scorer: DocumentScorer<'_>, documents: I, mut sink: F) -> Result<usize, E>
    where
        I: IntoIterator<Item = Result<Document, E>>,
        I::IntoIter: Send,
        F: FnMut(ScoreRow) -> Result<(), E>,
        E: Send,
    {
        let num_workers = self.config.resolved_workers().max(1);
        let (work_tx, work_rx) = channel::bounded::<WorkItem>(self.config.queue_capacity.max(1));
        let (result_tx, result_rx) = channel::unbounded::<(u64, ScoreRow)>();
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let core_ids = if self.config.pin_to_cores {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };

        debug!("Starting {} scoring workers", num_workers);

        thread::scope(|scope| {
            for i in 0..num_workers {
                let receiver = work_rx.clone();
                let results = result_tx.clone();
                let core_id = core_ids.get(i).copied();

                scope.spawn(move || {
                    if let Some(core) = core_id {
                        if core_affinity::set_for_current(core) {
                            debug!("Scoring worker {} pinned to core {:?}", i, core);
                        }
                    }
                    Self::worker_loop(i, scorer, receiver, results);
                });
            }
            drop(work_rx);
            drop(result_tx);

            let documents = documents.into_iter();
            let feeder = scope.spawn(move || Self::feed(documents, work_tx, stop_rx));

            let mut reorder: BTreeMap<u64, ScoreRow> = BTreeMap::new();
            let mut next = 0u64;
            let mut sink_error: Option<E> = None;

            for (ticket, row) in result_rx.iter() {
                if sink_error.is_some() {
                    continue;
                }
                reorder.insert(ticket, row);
                while let Some(row) = reorder.remove(&next) {
                    if let Err(e) = sink(row) {
                        let _ = stop_tx.try_send(());
                        sink_error = Some(e);
                        break;
                    }
                    next += 1;
                }
            }

            let fed = match feeder.join() {
                Ok(fed) => fed,
                Err(panic) => std::panic::resume_unwind(panic),
            };

            match sink_error {
                Some(e) => Err(e),
                None => fed.map(|()| next as usize),
            }
        })
    }

    /// Queue documents with consecutive tickets until exhausted, told to stop,
    /// or the source fails
    fn feed<I, E>(documents: I, work_tx: Sender<WorkItem>, stop_rx: Receiver<()>) -> Result<(), E>
    where
        I: Iterator<Item = Result<Document, E>>,
    {
        for (ticket, document) in (0u64..).zip(documents) {
            if stop_rx.try_recv().is_ok() {
                debug!("Scoring stopped after {} documents", ticket);
                break;
            }
            let item = WorkItem {
                ticket,
                document: document?,
            };
            if work_tx.send(item).is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Worker main loop
    fn worker_loop(
        worker_id: usize,
        scorer: DocumentScorer<'_>,
        receiver: Receiver<WorkItem>,
        results: Sender<(u64, ScoreRow)>,
    ) {
        let mut scored = 0usize;
        while let Ok(item) = receiver.recv() {
            let row = scorer.score(&item.document);
            if results.send((item.ticket, row)).is_err() {
                debug!("Scoring worker {}: result channel closed", worker_id);
                break;
            }
            scored += 1;
        }
        debug!("Scoring worker {} stopped after {} documents", worker_id, scored);
    }
}
