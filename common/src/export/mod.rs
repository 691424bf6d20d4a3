//! Export core modules shared across CLI and library users.

#[cfg(feature = "excel")]
pub mod excel_core;
