pub mod command;
pub mod error;
pub mod path;

pub use command::{CapturedOutput, output_with_timeout};
pub use error::{Error, Result};
pub use path::*;
