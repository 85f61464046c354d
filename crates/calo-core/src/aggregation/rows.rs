use crate::domain::AuxiliaryRecord;
use crate::tables::ColumnValue;

/// Per-channel energies of one event plus the trailing hit flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEnergyRow {
    energies: Vec<f64>,
    any_hit: bool,
}

impl ChannelEnergyRow {
    pub(crate) fn new(energies: Vec<f64>, any_hit: bool) -> Self {
        Self { energies, any_hit }
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn energy(&self, index: usize) -> Option<f64> {
        self.energies.get(index).copied()
    }

    pub fn any_hit(&self) -> bool {
        self.any_hit
    }

    pub fn flag(&self) -> i64 {
        i64::from(self.any_hit)
    }

    pub fn nonzero_channels(&self) -> Vec<usize> {
        self.energies
            .iter()
            .enumerate()
            .filter(|(_, energy)| **energy != 0.0)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn column_values(&self) -> Vec<ColumnValue> {
        self.energies
            .iter()
            .map(|energy| ColumnValue::Double(*energy))
            .chain(std::iter::once(ColumnValue::Int(self.flag())))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryRow {
    pub aux_total_energy: f64,
    pub aux_x: f64,
    pub aux_y: f64,
    pub calorimeter_total_energy: f64,
}

impl SummaryRow {
    pub(crate) fn new(auxiliary: Option<AuxiliaryRecord>, calorimeter_total_energy: f64) -> Self {
        let auxiliary = auxiliary.unwrap_or_default();
        Self {
            aux_total_energy: auxiliary.total_energy,
            aux_x: auxiliary.x,
            aux_y: auxiliary.y,
            calorimeter_total_energy,
        }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (
            self.aux_total_energy,
            self.aux_x,
            self.aux_y,
            self.calorimeter_total_energy,
        )
    }

    pub fn column_values(&self) -> Vec<ColumnValue> {
        vec![
            ColumnValue::Double(self.aux_total_energy),
            ColumnValue::Double(self.aux_x),
            ColumnValue::Double(self.aux_y),
            ColumnValue::Double(self.calorimeter_total_energy),
        ]
    }
}

/// The pair of rows one committed event contributes to the output tables.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRows {
    pub channel: ChannelEnergyRow,
    pub summary: SummaryRow,
}
