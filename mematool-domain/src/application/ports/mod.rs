pub mod config;
pub mod directory;
pub mod repository;

pub use config::*;
pub use directory::*;
pub use repository::*;
