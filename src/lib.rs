//! Teacher-evaluation dashboard pipeline: load a spreadsheet of evaluation
//! records, validate and clean it, filter by program/subject/period, and
//! derive the six dashboard views and their spreadsheet downloads.

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;
