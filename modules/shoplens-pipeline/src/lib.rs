pub mod adapters;
pub mod aggregator;
pub mod capture;
pub mod enrichment;
pub mod files;
pub mod pacing;
pub mod pipeline;
pub mod report;
pub mod store;
