pub mod attribute;
pub mod element;
pub mod error;
pub mod filter;
pub mod header;

pub use attribute::*;
pub use element::*;
pub use error::*;
pub use filter::*;
pub use header::*;
