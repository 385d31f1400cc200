//! Vision operation registry
//!
//! Maps human-readable names to opaque frame transforms. The registry does not
//! implement any transform itself; providers hand closures to the builder at
//! startup and the table is read-only from then on.

pub mod naming;
pub mod operation;
pub mod registry;

pub use naming::*;
pub use operation::*;
pub use registry::*;
