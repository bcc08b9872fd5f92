pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod startup;

pub use domain::user;
pub use outbound::repositories;
