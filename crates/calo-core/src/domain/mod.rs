pub mod errors;

pub use errors::{CaloError, CaloErrorCategory, CaloResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Energy deposited in one calorimeter channel during one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelHit {
    pub index: usize,
    pub energy: f64,
}

impl ChannelHit {
    pub const fn new(index: usize, energy: f64) -> Self {
        Self { index, energy }
    }
}

/// Once-per-event record produced by the auxiliary ring detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxiliaryRecord {
    pub total_energy: f64,
    pub x: f64,
    pub y: f64,
}

impl AuxiliaryRecord {
    pub const fn new(total_energy: f64, x: f64, y: f64) -> Self {
        Self { total_energy, x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTable {
    ChannelEnergy,
    Summary,
}

impl OutputTable {
    pub const ALL: [OutputTable; 2] = [Self::ChannelEnergy, Self::Summary];

    /// Table id as used by the downstream analysis files.
    pub const fn id(self) -> usize {
        match self {
            Self::ChannelEnergy => 0,
            Self::Summary => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChannelEnergy => "channel-energy",
            Self::Summary => "summary",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::ChannelEnergy => "channel_energy.csv",
            Self::Summary => "summary.csv",
        }
    }
}

impl Display for OutputTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialRole {
    World,
    Target,
    Calorimeter,
    Lining,
}

impl MaterialRole {
    pub const ALL: [MaterialRole; 4] = [Self::World, Self::Target, Self::Calorimeter, Self::Lining];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Target => "target",
            Self::Calorimeter => "calorimeter",
            Self::Lining => "lining",
        }
    }
}

impl Display for MaterialRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
