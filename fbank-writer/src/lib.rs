pub mod attributes;
pub mod config;
pub mod error;
pub mod metrics;
pub mod session;
pub mod spectrometer;

pub use attributes::*;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use session::*;
pub use spectrometer::*;
