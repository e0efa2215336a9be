pub mod alias;
pub mod cascade;
pub mod common;
pub mod group;
pub mod mail_domain;
pub mod member;

pub use alias::*;
pub use cascade::*;
pub use common::*;
pub use group::*;
pub use mail_domain::*;
pub use member::*;
