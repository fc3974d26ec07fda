#[macro_use]
pub mod macros;
pub mod file_format;
pub mod float_ext;
pub mod locale_float;
pub mod log_setup;
pub mod parallel;
pub mod serde;
pub mod test_utils;

pub use file_format::FileFormat;

pub const EPSILON: f64 = 1e-9;
