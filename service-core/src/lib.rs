//! service-core: shared infrastructure for the POS services.

pub mod error;
pub mod middleware;
pub mod observability;
