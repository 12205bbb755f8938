//! # boxoffice-queue
//!
//! Waiting room in front of the seat reservation engine. Visitors are
//! sharded into fixed-size groups by arrival order; a periodic tick promotes
//! each group in FIFO batches by setting a ready flag with a TTL.

pub mod controller;

pub use controller::AdmissionController;
