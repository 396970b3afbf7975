//! Execution engine for running the summary pipeline with configurable parallelism.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Parallel (chunked) projection and aggregation
//! - Resource limits / throttling (in-flight chunks)
//! - Real-time metrics + observer hooks for monitoring
//!
//! The engine is an explicit handle: create it once, pass it by reference to whatever runs the
//! pipeline, drop it at shutdown. Aggregation builds one partial [`GroupTable`] per chunk and
//! merges them in chunk order, so rounding happens once on the full means and the output does not
//! depend on thread scheduling.

mod observer;
mod semaphore;

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::processing::{GroupTable, GroupedRecord, SummaryProjector, SummaryRecord};
use crate::types::DataSet;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows (or records) per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently executing chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 4_096,
            max_in_flight_chunks: n.max(1),
        }
    }
}

/// A configurable execution engine for the summary pipeline.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size == 0`, `max_in_flight_chunks == 0`, or `num_threads == Some(0)`.
    pub fn new(opts: ExecutionOptions) -> Self {
        assert!(opts.chunk_size > 0, "chunk_size must be > 0");
        assert!(
            opts.max_in_flight_chunks > 0,
            "max_in_flight_chunks must be > 0"
        );
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("time-use-worker-{i}"))
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The options this engine was built with.
    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Project every row of `dataset` in parallel, keeping input order.
    pub fn project_parallel(&self, projector: &SummaryProjector, dataset: &DataSet) -> Vec<SummaryRecord> {
        self.pool.install(|| {
            self.run(|| {
                let per_chunk = self.run_chunks(dataset.row_count(), |range| {
                    let out: Vec<SummaryRecord> = dataset.rows[range]
                        .iter()
                        .filter_map(|row| projector.project_row(row))
                        .collect();
                    let n = out.len();
                    (out, n)
                });
                per_chunk.into_iter().flatten().collect()
            })
        })
    }

    /// Group and average already-projected records in parallel.
    pub fn aggregate_parallel(&self, records: &[SummaryRecord]) -> Vec<GroupedRecord> {
        self.pool.install(|| {
            self.run(|| {
                self.emit(ExecutionEvent::AggregateStarted {
                    records: records.len(),
                });
                let partials = self.run_chunks(records.len(), |range| {
                    let mut table = GroupTable::new();
                    table.extend(&records[range]);
                    let n = table.len();
                    (table, n)
                });
                self.finish_groups(partials)
            })
        })
    }

    /// Project and aggregate in one pass: each chunk feeds its own partial table.
    pub fn summarize(&self, projector: &SummaryProjector, dataset: &DataSet) -> Vec<GroupedRecord> {
        self.pool.install(|| {
            self.run(|| {
                self.emit(ExecutionEvent::AggregateStarted {
                    records: dataset.row_count(),
                });
                let partials = self.run_chunks(dataset.row_count(), |range| {
                    let mut table = GroupTable::new();
                    table.extend(dataset.rows[range].iter().filter_map(|row| projector.project_row(row)));
                    let n = table.len();
                    (table, n)
                });
                self.finish_groups(partials)
            })
        })
    }

    fn finish_groups(&self, partials: Vec<GroupTable>) -> Vec<GroupedRecord> {
        let mut merged = GroupTable::new();
        for partial in partials {
            merged.merge(partial);
        }
        let out = merged.finish();
        self.emit(ExecutionEvent::AggregateFinished { groups: out.len() });
        out
    }

    /// Wrap one run with metrics reset and start/finish events.
    fn run<R>(&self, body: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted);

        let out = body();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        out
    }

    /// Run `work` over chunk ranges of `0..len` on the pool, returning results in chunk order.
    ///
    /// `work` returns its chunk result plus the number of output items, for events.
    fn run_chunks<T, F>(&self, len: usize, work: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> (T, usize) + Send + Sync,
    {
        let sem = Semaphore::new(self.opts.max_in_flight_chunks);

        chunk_ranges(len, self.opts.chunk_size)
            .into_par_iter()
            .map(|range| {
                let waited = sem.acquire();
                if waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(waited);
                    self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                }

                self.metrics.on_chunk_start();
                self.emit(ExecutionEvent::ChunkStarted {
                    start_row: range.start,
                    row_count: range.end - range.start,
                });

                let rows = (range.end - range.start) as u64;
                let (out, output_rows) = work(range);
                self.metrics.on_rows_processed(rows);

                self.emit(ExecutionEvent::ChunkFinished { output_rows });
                self.metrics.on_chunk_end();
                sem.release();
                out
            })
            .collect()
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    if row_count == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(row_count.div_ceil(chunk_size));
    let mut start = 0usize;
    while start < row_count {
        let end = (start + chunk_size).min(row_count);
        out.push(start..end);
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{chunk_ranges, ExecutionEngine, ExecutionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::ingestion::{decode_row, infer_schema};
    use crate::processing::{aggregate, classify_columns, SummaryProjector};
    use crate::types::DataSet;

    const HEADER: [&str; 7] = ["id", "t010101", "t050101", "t120101", "telfs", "tesex", "teage"];

    // Arbitrary whole minutes, so per-row hours are inexact.
    fn survey_of_n(n: usize) -> DataSet {
        let schema = infer_schema(&HEADER).unwrap();
        let rows = (0..n)
            .map(|i| {
                let id = i.to_string();
                let primary = (400 + (i * 37) % 301).to_string();
                let work = ((i * 53) % 601).to_string();
                let other = ((i * 11) % 421).to_string();
                let telfs = (1 + i % 5).to_string();
                let tesex = (1 + i % 2).to_string();
                let teage = (15 + (i * 7) % 70).to_string();
                let raw = [&id, &primary, &work, &other, &telfs, &tesex, &teage];
                decode_row(i + 2, &raw, &schema).unwrap()
            })
            .collect();
        DataSet::new(schema, rows)
    }

    fn projector(ds: &DataSet) -> SummaryProjector {
        SummaryProjector::new(&classify_columns(&HEADER), &ds.schema).unwrap()
    }

    fn engine(threads: usize, chunk_size: usize, in_flight: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(threads),
            chunk_size,
            max_in_flight_chunks: in_flight,
        })
    }

    #[test]
    fn chunk_ranges_cover_input() {
        assert!(chunk_ranges(0, 4).is_empty());
        assert_eq!(chunk_ranges(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(chunk_ranges(3, 10), vec![0..3]);
    }

    #[test]
    fn parallel_projection_matches_sequential_order() {
        let ds = survey_of_n(500);
        let p = projector(&ds);
        let sequential: Vec<_> = p.project(&ds).collect();
        let parallel = engine(4, 7, 4).project_parallel(&p, &ds);
        assert_eq!(parallel, sequential);
        // telfs == 5 for every fifth row.
        assert_eq!(parallel.len(), 400);
    }

    #[test]
    fn parallel_aggregation_matches_sequential() {
        let ds = survey_of_n(1_000);
        let p = projector(&ds);
        let expected = aggregate(p.project(&ds));

        let eng = engine(4, 13, 4);
        assert_eq!(eng.summarize(&p, &ds), expected);

        let records = eng.project_parallel(&p, &ds);
        assert_eq!(eng.aggregate_parallel(&records), expected);
    }

    #[test]
    fn chunking_and_engine_choice_do_not_change_rounding() {
        let ds = survey_of_n(997);
        let p = projector(&ds);

        let single_chunk = engine(1, 1_000_000, 1).summarize(&p, &ds);
        let one_row_chunks = engine(4, 1, 4).summarize(&p, &ds);
        assert_eq!(one_row_chunks, single_chunk);

        let groups = classify_columns(&HEADER);
        assert_eq!(crate::frame::summarize_frame(&groups, &ds).unwrap(), single_chunk);
    }

    #[test]
    fn empty_dataset_yields_no_groups() {
        let ds = survey_of_n(0);
        let p = projector(&ds);
        let eng = engine(2, 8, 2);
        assert!(eng.project_parallel(&p, &ds).is_empty());
        assert!(eng.summarize(&p, &ds).is_empty());
    }

    struct ConcurrencyObserver {
        active_chunks: AtomicUsize,
        max_active_chunks: AtomicUsize,
        aggregates_finished: AtomicUsize,
    }

    impl ConcurrencyObserver {
        fn new() -> Self {
            Self {
                active_chunks: AtomicUsize::new(0),
                max_active_chunks: AtomicUsize::new(0),
                aggregates_finished: AtomicUsize::new(0),
            }
        }
        fn max(&self) -> usize {
            self.max_active_chunks.load(Ordering::SeqCst)
        }
        fn bump_max(&self, now: usize) {
            loop {
                let cur = self.max_active_chunks.load(Ordering::SeqCst);
                if now <= cur {
                    break;
                }
                if self.max_active_chunks
                    .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    break;
                }
            }
        }
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::ChunkStarted { .. } => {
                    let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
                    self.bump_max(now);
                    // Make chunks long enough to overlap if not throttled.
                    std::thread::sleep(Duration::from_millis(1));
                }
                ExecutionEvent::ChunkFinished { .. } => {
                    let _ = self.active_chunks.fetch_sub(1, Ordering::SeqCst);
                }
                ExecutionEvent::AggregateFinished { .. } => {
                    let _ = self.aggregates_finished.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn max_in_flight_chunks_throttles_chunk_concurrency() {
        let ds = survey_of_n(100);
        let p = projector(&ds);
        let observer = Arc::new(ConcurrencyObserver::new());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let eng = engine(4, 1, 1).with_observer(obs_trait);

        let out = eng.summarize(&p, &ds);

        assert!(!out.is_empty());
        assert_eq!(observer.max(), 1);
        assert_eq!(observer.aggregates_finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let ds = survey_of_n(60);
        let p = projector(&ds);
        let observer: Arc<dyn ExecutionObserver> = Arc::new(ConcurrencyObserver::new());
        let eng = engine(4, 1, 1).with_observer(observer);
        let metrics = eng.metrics();

        let out = eng.project_parallel(&p, &ds);
        assert_eq!(out.len(), 48);

        let snap = metrics.snapshot();
        assert_eq!(snap.rows_processed, ds.row_count() as u64);
        assert_eq!(snap.chunks_started, ds.row_count() as u64);
        assert_eq!(snap.chunks_finished, ds.row_count() as u64);
        assert_eq!(snap.max_active_chunks, 1);
        assert!(snap.throttle_wait > Duration::ZERO);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    #[should_panic(expected = "chunk_size must be > 0")]
    fn zero_chunk_size_is_rejected() {
        let _ = engine(1, 0, 1);
    }
}
