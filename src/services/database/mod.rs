//! The dialect layer: driver abstraction, drivers, value normalization and
//! the active-connection registry.

pub mod drivers;
pub mod normalize;
pub mod registry;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use drivers::ConnectionFactory;
pub use registry::{ActiveConnection, ConnectionRegistry};
