pub mod command;
pub mod event;
pub mod sensors;

pub use command::Command;
pub use event::{CaptureOrigin, ConsoleEvent, Diagnosis, Mode};
pub use sensors::SensorSnapshot;
