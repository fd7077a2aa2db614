//! Occupancy Records
//!
//! One record per observation: seven raw sensor features plus the labeled
//! occupancy state. The on-disk format is a headerless CSV with the state
//! as a trailing integer column.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::normalize::FeatureScaler;
use super::DataError;
use crate::utility::OccupancyState;

/// Number of sensor features per reading.
pub const NUM_FEATURES: usize = 7;

/// Raw sensor snapshot of one slot (apartment) at one point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlotReading {
    /// Hour of day, 0-23
    pub hour: f64,
    /// Outdoor temperature in degrees Celsius
    pub outdoor_temp: f64,
    /// Lights activity level, 0-1
    pub lights: f64,
    /// Motion activity level, 0-1
    pub motion: f64,
    /// Electrical power draw in kW
    pub power_draw: f64,
    /// Energy price for the slot
    pub energy_price: f64,
    /// Indoor temperature in degrees Celsius
    pub indoor_temp: f64,
}

impl SlotReading {
    /// Raw feature values in network input order.
    pub fn raw_features(&self) -> [f64; NUM_FEATURES] {
        [
            self.hour,
            self.outdoor_temp,
            self.lights,
            self.motion,
            self.power_draw,
            self.energy_price,
            self.indoor_temp,
        ]
    }

    fn from_fields(fields: &[f64; NUM_FEATURES]) -> Self {
        Self {
            hour: fields[0],
            outdoor_temp: fields[1],
            lights: fields[2],
            motion: fields[3],
            power_draw: fields[4],
            energy_price: fields[5],
            indoor_temp: fields[6],
        }
    }
}

/// A sensor reading together with its labeled occupancy state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub reading: SlotReading,
    pub state: OccupancyState,
}

/// A labeled training dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<OccupancyRecord>,
}

impl Dataset {
    pub fn new(records: Vec<OccupancyRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a headerless CSV dataset.
    ///
    /// Columns: hour, outdoor temperature, lights, motion, power draw,
    /// energy price, indoor temperature, occupancy state (0 = Away,
    /// 1 = Home, 2 = Sleep).
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut records = Vec::new();

        for (i, result) in reader.records().enumerate() {
            let line = i + 1;
            let record = result?;

            if record.len() != NUM_FEATURES + 1 {
                return Err(DataError::MalformedRecord {
                    line,
                    expected: NUM_FEATURES + 1,
                    found: record.len(),
                });
            }

            let mut fields = [0.0; NUM_FEATURES];
            for (field, slot) in fields.iter_mut().enumerate() {
                *slot = record[field]
                    .parse()
                    .map_err(|source| DataError::ParseField { line, field, source })?;
            }

            let label = &record[NUM_FEATURES];
            let state = label
                .parse::<usize>()
                .ok()
                .and_then(OccupancyState::from_index)
                .ok_or_else(|| DataError::InvalidState {
                    line,
                    value: label.to_string(),
                })?;

            records.push(OccupancyRecord {
                reading: SlotReading::from_fields(&fields),
                state,
            });
        }

        if records.is_empty() {
            return Err(DataError::Empty);
        }

        Ok(Self::new(records))
    }

    /// Build the network's training matrices: scaled features and one-hot
    /// targets, one row per record.
    pub fn to_matrices(&self, scaler: &FeatureScaler) -> (Array2<f64>, Array2<f64>) {
        let n = self.records.len();
        let mut features = Array2::zeros((n, NUM_FEATURES));
        let mut targets = Array2::zeros((n, OccupancyState::COUNT));

        for (i, record) in self.records.iter().enumerate() {
            features.row_mut(i).assign(&scaler.scale(&record.reading));
            targets[[i, record.state.index()]] = 1.0;
        }

        (features, targets)
    }
}

/// Load unlabeled slot readings from a headerless CSV with the seven
/// feature columns, for inference-time snapshots.
pub fn load_readings_csv<P: AsRef<Path>>(path: P) -> Result<Vec<SlotReading>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut readings = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let line = i + 1;
        let record = result?;

        if record.len() != NUM_FEATURES {
            return Err(DataError::MalformedRecord {
                line,
                expected: NUM_FEATURES,
                found: record.len(),
            });
        }

        let mut fields = [0.0; NUM_FEATURES];
        for (field, slot) in fields.iter_mut().enumerate() {
            *slot = record[field]
                .parse()
                .map_err(|source| DataError::ParseField { line, field, source })?;
        }

        readings.push(SlotReading::from_fields(&fields));
    }

    if readings.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(readings)
}
