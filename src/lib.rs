pub mod error;
pub mod realtime;
pub mod transport;
pub mod types;
pub use error::{Result, RtError};
