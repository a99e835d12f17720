//! Item file format implementations.
//!
//! Each format implements [`RecordParser`](crate::traits::RecordParser).

pub mod json;
