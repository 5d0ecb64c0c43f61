pub mod fixtures;
pub mod fs;

pub use fs::create_file;
pub use scopeguard::defer;
