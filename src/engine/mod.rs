//! Trading engine: order execution and the daily session.

pub mod executor;
pub mod session;
