pub mod discovery;
pub mod finding;
pub mod pattern;

pub use discovery::*;
pub use finding::*;
pub use pattern::*;
