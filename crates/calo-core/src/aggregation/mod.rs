//! Per-event reduction of calorimeter hits into output rows.
//!
//! [`EventAggregator`] is a two-state machine: `Idle` between events and
//! `InEvent` while one event's hits are being recorded. An event ends either
//! in [`EventAggregator::commit_event`], which yields exactly one row for each
//! output table, or in [`EventAggregator::discard_event`], which yields
//! nothing.

pub mod parallel;
pub mod pipeline;
pub mod rows;

pub use parallel::{MergedRows, WorkerRowBuffer, aggregate_in_workers, merge_worker_buffers};
pub use pipeline::{AuxiliarySource, ChannelHitSource, EventHits, EventOutcome, EventPipeline};
pub use rows::{ChannelEnergyRow, EventRows, SummaryRow};

use crate::domain::{AuxiliaryRecord, CaloError, CaloResult};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregatorState {
    Idle,
    InEvent,
}

impl AggregatorState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InEvent => "in-event",
        }
    }
}

impl Display for AggregatorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EventAggregator {
    state: AggregatorState,
    channel_energies: Vec<f64>,
    auxiliary: Option<AuxiliaryRecord>,
    events_committed: u64,
    events_discarded: u64,
}

impl EventAggregator {
    pub fn new(total_elements: usize) -> Self {
        Self {
            state: AggregatorState::Idle,
            channel_energies: vec![0.0; total_elements],
            auxiliary: None,
            events_committed: 0,
            events_discarded: 0,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn total_elements(&self) -> usize {
        self.channel_energies.len()
    }

    pub fn events_committed(&self) -> u64 {
        self.events_committed
    }

    pub fn events_discarded(&self) -> u64 {
        self.events_discarded
    }

    pub fn begin_event(&mut self) -> CaloResult<()> {
        if self.state == AggregatorState::InEvent {
            return Err(CaloError::event_protocol(
                "EVENT.ALREADY_IN_EVENT",
                "begin_event called before the previous event was committed or discarded",
            ));
        }

        // Buffer is reused; the flag is derived from it at commit.
        self.channel_energies.fill(0.0);
        self.auxiliary = None;
        self.state = AggregatorState::InEvent;
        Ok(())
    }

    pub fn record_channel_hit(&mut self, index: usize, energy: f64) -> CaloResult<()> {
        self.require_in_event("record_channel_hit")?;

        let total_elements = self.total_elements();
        let Some(slot) = self.channel_energies.get_mut(index) else {
            return Err(CaloError::input_validation(
                "INPUT.CHANNEL_INDEX",
                format!(
                    "channel index {} is outside [0, {})",
                    index, total_elements
                ),
            ));
        };
        if !energy.is_finite() || energy < 0.0 {
            return Err(CaloError::input_validation(
                "INPUT.CHANNEL_ENERGY",
                format!(
                    "channel {} energy must be finite and non-negative, got {}",
                    index, energy
                ),
            ));
        }

        *slot = energy;
        Ok(())
    }

    pub fn record_auxiliary(&mut self, total_energy: f64, x: f64, y: f64) -> CaloResult<()> {
        self.require_in_event("record_auxiliary")?;

        if !(total_energy.is_finite() && x.is_finite() && y.is_finite()) {
            return Err(CaloError::input_validation(
                "INPUT.AUXILIARY_RECORD",
                format!(
                    "auxiliary record must be finite, got ({}, {}, {})",
                    total_energy, x, y
                ),
            ));
        }

        self.auxiliary = Some(AuxiliaryRecord::new(total_energy, x, y));
        Ok(())
    }

    pub fn commit_event(&mut self) -> CaloResult<EventRows> {
        self.require_in_event("commit_event")?;

        let mut any_hit = false;
        let mut total = 0.0;
        for energy in self.channel_energies.iter().filter(|energy| **energy > 0.0) {
            any_hit = true;
            total += energy;
        }

        let rows = EventRows {
            channel: ChannelEnergyRow::new(self.channel_energies.clone(), any_hit),
            summary: SummaryRow::new(self.auxiliary, total),
        };

        self.state = AggregatorState::Idle;
        self.events_committed += 1;
        tracing::debug!(
            event = self.events_committed,
            any_hit,
            calorimeter_total_energy = total,
            auxiliary = self.auxiliary.is_some(),
            "event committed"
        );
        Ok(rows)
    }

    pub fn discard_event(&mut self) -> CaloResult<()> {
        self.require_in_event("discard_event")?;
        self.state = AggregatorState::Idle;
        self.events_discarded += 1;
        tracing::debug!(discarded = self.events_discarded, "event discarded");
        Ok(())
    }

    fn require_in_event(&self, operation: &str) -> CaloResult<()> {
        if self.state == AggregatorState::InEvent {
            Ok(())
        } else {
            Err(CaloError::event_protocol(
                "EVENT.NOT_IN_EVENT",
                format!("{operation} called while no event is open"),
            ))
        }
    }
}
