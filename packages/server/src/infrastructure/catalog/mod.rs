//! Catalog 実装

pub mod json_file;

pub use json_file::JsonFileCatalog;
