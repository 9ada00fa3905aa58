pub mod encoding;
pub mod errors;
pub mod models;
pub mod scaling;

pub use errors::{EncodingError, ValidationError};
pub use models::{format_address, parse_address, PrecisionTriple};
