mod types;

pub use types::{PadError, Result};
