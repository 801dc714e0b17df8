pub mod checksum;
pub mod error;
pub mod tasks;

pub use checksum::{calculate_checksum, calculate_file_checksum};
pub use error::*;
pub use tasks::{RemoteTask, Tasks};
