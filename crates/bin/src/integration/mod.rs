//! Glue between the async price providers and the synchronous analytics core.

pub(crate) mod data_pipeline;
