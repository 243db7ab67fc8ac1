//! Ingestion-side transforms for the climate pipeline.
//!
//! Everything here turns source-shaped rows into the canonical schema the
//! analysis stages expect. Nothing in this module fetches data; rows arrive
//! already acquired from an external collaborator.
//!
//! Submodules:
//! - `columns`:  alias resolution and cell coercion.
//! - `reshape`:  wide-to-long melt, annual tables, long-to-wide entity pivot.
//! - `calendar`: leap-day elision and day-of-year remapping.

pub mod calendar;
pub mod columns;
pub mod reshape;
