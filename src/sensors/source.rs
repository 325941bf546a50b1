use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;

/// Sensor name to current value for one category.
pub type Readings = BTreeMap<String, f64>;

#[derive(Debug, Error, PartialEq)]
pub enum SensorError {
    #[error("Category not found")]
    CategoryNotFound,

    #[error("Sensor {category}/{sensor} not found.")]
    SensorNotFound { category: String, sensor: String },
}

/// Where dashboard readings come from.
pub trait SensorReadingSource: Send + Sync {
    fn readings(&self, category: &str) -> Result<Readings, SensorError>;
    fn set_reading(&self, category: &str, sensor: &str, value: f64) -> Result<(), SensorError>;
}

/// Fixed demo values, one map per category; updates live only in memory.
///
/// Units: rainfall in inches, humidity and soil moisture in %, temperature in
/// °C, light in lux, conductivity in µS/cm.
pub struct PlaceholderSensors {
    categories: RwLock<HashMap<String, Readings>>,
}

fn readings(pairs: &[(&str, f64)]) -> Readings {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

impl Default for PlaceholderSensors {
    fn default() -> Self {
        let mut categories = HashMap::new();
        categories.insert(
            "water".to_string(),
            readings(&[
                ("rainfall", 0.5),
                ("humidity", 45.0),
                ("soil_moisture", 60.0),
                ("pump_status", 0.0),
                ("temperature", 25.0),
            ]),
        );
        categories.insert(
            "fert".to_string(),
            readings(&[("soil_moisture", 55.0), ("ph", 6.5), ("humidity", 50.0)]),
        );
        categories.insert(
            "electricity".to_string(),
            readings(&[
                ("temperature", 27.0),
                ("light", 400.0),
                ("conductivity", 300.0),
            ]),
        );
        Self {
            categories: RwLock::new(categories),
        }
    }
}

impl PlaceholderSensors {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SensorReadingSource for PlaceholderSensors {
    fn readings(&self, category: &str) -> Result<Readings, SensorError> {
        let categories = self.categories.read().unwrap_or_else(|e| e.into_inner());
        categories
            .get(category)
            .cloned()
            .ok_or(SensorError::CategoryNotFound)
    }

    fn set_reading(&self, category: &str, sensor: &str, value: f64) -> Result<(), SensorError> {
        let mut categories = self.categories.write().unwrap_or_else(|e| e.into_inner());
        let slot = categories
            .get_mut(category)
            .and_then(|r| r.get_mut(sensor))
            .ok_or_else(|| SensorError::SensorNotFound {
                category: category.to_string(),
                sensor: sensor.to_string(),
            })?;
        *slot = value;
        Ok(())
    }
}
