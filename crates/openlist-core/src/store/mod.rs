// Sensor state model: descriptors, cached values, and the reactive table.

mod sensor;
mod table;

pub use sensor::{SensorKey, SensorState, TaskCountKind, TaskCounts};
pub use table::SensorStore;
