//! Reclaim - file recovery from storage volumes
//!
//! Two strategies share one output pipeline:
//! - a metadata pass that copies still-listed files of the selected types;
//! - a carving pass that scans raw device bytes for file signatures.
//!
//! Layers:
//! - [`domain`]: entities, repository traits, signature registry, carving engine
//! - [`application`]: the recovery job, its worker thread and DTOs
//! - [`infrastructure`]: file-backed volumes, directory walking, output writer
//! - [`presentation`]: command-line interface

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
