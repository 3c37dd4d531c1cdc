// File-backed table stores

pub mod csv;

pub use crate::csv::CsvStore;
