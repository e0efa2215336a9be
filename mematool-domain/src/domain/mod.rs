pub mod diff;
pub mod entities;
pub mod errors;
