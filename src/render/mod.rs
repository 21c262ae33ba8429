//! Output rendering.
//!
//! Results go to stdout as JSON; errors go to stderr as text.

pub mod error;
pub mod robot;

pub use error::render_error;
pub use robot::render_json;
