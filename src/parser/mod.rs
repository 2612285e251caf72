pub mod notation;

pub use notation::{dms_to_decimal, parse_batch};
