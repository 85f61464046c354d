use super::{EventAggregator, EventRows};
use crate::domain::{AuxiliaryRecord, CaloError, CaloResult, ChannelHit};
use crate::geometry::LayoutTable;
use crate::tables::{TableSink, append_event_rows};
use serde::{Deserialize, Serialize};

/// Per-event channel hits handed over by the transport engine.
pub trait ChannelHitSource {
    fn channel_hits(&self) -> &[ChannelHit];
}

/// Per-event output of the auxiliary ring detector, if it fired.
pub trait AuxiliarySource {
    fn auxiliary_record(&self) -> Option<AuxiliaryRecord>;
}

/// One event as read from a replay file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventHits {
    pub channels: Vec<ChannelHit>,
    pub auxiliary: Option<AuxiliaryRecord>,
    pub aborted: bool,
}

impl ChannelHitSource for EventHits {
    fn channel_hits(&self) -> &[ChannelHit] {
        &self.channels
    }
}

impl AuxiliarySource for EventHits {
    fn auxiliary_record(&self) -> Option<AuxiliaryRecord> {
        self.auxiliary
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Committed(EventRows),
    Discarded,
}

/// Drives one aggregator over a stream of events and appends every committed
/// event to `sink`.
pub struct EventPipeline<'a, S: TableSink> {
    layout: &'a LayoutTable,
    aggregator: EventAggregator,
    sink: S,
}

impl<'a, S: TableSink> EventPipeline<'a, S> {
    pub fn new(layout: &'a LayoutTable, sink: S) -> Self {
        Self {
            layout,
            aggregator: EventAggregator::new(layout.total_elements()),
            sink,
        }
    }

    pub fn aggregator(&self) -> &EventAggregator {
        &self.aggregator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Aggregates one event and appends its rows. An error while recording
    /// discards the event before it is returned.
    pub fn process_event<C, A>(&mut self, channels: &C, auxiliary: &A) -> CaloResult<EventRows>
    where
        C: ChannelHitSource + ?Sized,
        A: AuxiliarySource + ?Sized,
    {
        let rows = aggregate_event(self.layout, &mut self.aggregator, channels, auxiliary)?;
        append_event_rows(&mut self.sink, &rows)?;
        Ok(rows)
    }

    pub fn process(&mut self, event: &EventHits) -> CaloResult<EventOutcome> {
        if event.aborted {
            self.aggregator.begin_event()?;
            self.aggregator.discard_event()?;
            tracing::warn!(
                hits = event.channels.len(),
                "aborted event discarded"
            );
            return Ok(EventOutcome::Discarded);
        }
        self.process_event(event, event).map(EventOutcome::Committed)
    }

    pub fn finish(mut self) -> CaloResult<S> {
        self.sink.flush()?;
        tracing::info!(
            committed = self.aggregator.events_committed(),
            discarded = self.aggregator.events_discarded(),
            "event stream finished"
        );
        Ok(self.sink)
    }
}

/// Runs begin, record and commit for one event on `aggregator`.
///
/// Positive energy on a channel the layout does not instantiate is rejected:
/// no crystal sits there to collect it.
pub(crate) fn aggregate_event<C, A>(
    layout: &LayoutTable,
    aggregator: &mut EventAggregator,
    channels: &C,
    auxiliary: &A,
) -> CaloResult<EventRows>
where
    C: ChannelHitSource + ?Sized,
    A: AuxiliarySource + ?Sized,
{
    aggregator.begin_event()?;
    match record_event(layout, aggregator, channels, auxiliary) {
        Ok(()) => aggregator.commit_event(),
        Err(error) => {
            aggregator.discard_event()?;
            tracing::warn!(
                placeholder = error.placeholder(),
                "event discarded after a recording error"
            );
            Err(error)
        }
    }
}

fn record_event<C, A>(
    layout: &LayoutTable,
    aggregator: &mut EventAggregator,
    channels: &C,
    auxiliary: &A,
) -> CaloResult<()>
where
    C: ChannelHitSource + ?Sized,
    A: AuxiliarySource + ?Sized,
{
    for hit in channels.channel_hits() {
        if hit.energy > 0.0
            && layout
                .get(hit.index)
                .is_some_and(|channel| !channel.included)
        {
            return Err(CaloError::input_validation(
                "INPUT.CHANNEL_EXCLUDED",
                format!(
                    "channel {} is excluded from the layout but received energy {}",
                    hit.index, hit.energy
                ),
            ));
        }
        aggregator.record_channel_hit(hit.index, hit.energy)?;
    }

    if let Some(record) = auxiliary.auxiliary_record() {
        aggregator.record_auxiliary(record.total_energy, record.x, record.y)?;
    }
    Ok(())
}
