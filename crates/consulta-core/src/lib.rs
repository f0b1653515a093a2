//! Consulta Core: error type, configuration and the injectable clock.

pub mod clock;
pub mod config;
pub mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConsultaConfig, DataPaths, DEFAULT_PORT, DEFAULT_TIMEZONE};
pub use error::{Error, Result};
