//! Multi-worker aggregation with an event-ordered merge.
//!
//! Every worker owns its aggregator and its row buffer; only the layout is
//! shared. Buffers are merged by event id before anything reaches a sink, so
//! the tables come out in input order whatever the worker count.

use super::pipeline::aggregate_event;
use super::{EventAggregator, EventHits, EventRows};
use crate::domain::{CaloError, CaloResult};
use crate::geometry::LayoutTable;
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerRowBuffer {
    rows: Vec<(u64, EventRows)>,
    discarded: u64,
}

impl WorkerRowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_id: u64, rows: EventRows) {
        self.rows.push((event_id, rows));
    }

    pub fn mark_discarded(&mut self) {
        self.discarded += 1;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

/// Result of [`merge_worker_buffers`]: committed rows in event order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRows {
    pub rows: Vec<EventRows>,
    pub discarded: u64,
}

pub fn merge_worker_buffers(buffers: Vec<WorkerRowBuffer>) -> CaloResult<MergedRows> {
    let discarded = buffers.iter().map(WorkerRowBuffer::discarded).sum();
    let mut tagged = buffers
        .into_iter()
        .flat_map(|buffer| buffer.rows)
        .collect::<Vec<_>>();
    tagged.sort_by_key(|(event_id, _)| *event_id);

    if let Some(pair) = tagged.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(CaloError::internal(
            "RUN.DUPLICATE_EVENT",
            format!("event {} was committed by more than one worker", pair[0].0),
        ));
    }

    Ok(MergedRows {
        rows: tagged.into_iter().map(|(_, rows)| rows).collect(),
        discarded,
    })
}

/// Aggregates `events` on `workers` threads and returns the merged rows.
///
/// Events are split into contiguous chunks, one aggregator per chunk. The
/// first failing event, in input order, fails the whole batch.
pub fn aggregate_in_workers(
    layout: &LayoutTable,
    events: &[EventHits],
    workers: usize,
) -> CaloResult<MergedRows> {
    let workers = workers.max(1);
    let chunk_len = events.len().div_ceil(workers).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|error| {
            CaloError::internal(
                "RUN.WORKER_POOL",
                format!("failed to start {workers} aggregation workers: {error}"),
            )
        })?;

    let buffers = pool.install(|| {
        events
            .par_chunks(chunk_len)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                aggregate_chunk(layout, (chunk_index * chunk_len) as u64, chunk)
            })
            .collect::<Vec<_>>()
    });

    let buffers = buffers.into_iter().collect::<CaloResult<Vec<_>>>()?;
    let merged = merge_worker_buffers(buffers)?;
    tracing::info!(
        workers,
        committed = merged.rows.len(),
        discarded = merged.discarded,
        "worker buffers merged"
    );
    Ok(merged)
}

fn aggregate_chunk(
    layout: &LayoutTable,
    first_event_id: u64,
    events: &[EventHits],
) -> CaloResult<WorkerRowBuffer> {
    let mut aggregator = EventAggregator::new(layout.total_elements());
    let mut buffer = WorkerRowBuffer::new();

    for (offset, event) in events.iter().enumerate() {
        let event_id = first_event_id + offset as u64;
        if event.aborted {
            buffer.mark_discarded();
            continue;
        }
        let rows = aggregate_event(layout, &mut aggregator, event, event).map_err(|error| {
            CaloError::new(
                error.category(),
                error.placeholder(),
                format!("event {}: {}", event_id, error.message()),
            )
        })?;
        buffer.push(event_id, rows);
    }

    Ok(buffer)
}
