//! Exporting chains. Each format sits behind a feature of the same name.

#[cfg(feature = "csv")]
pub mod csv;
