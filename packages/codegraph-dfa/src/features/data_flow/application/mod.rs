/*
 * Data Flow Application Layer
 *
 * Use cases: single-method and batch analysis.
 */

mod analyzer;

pub use analyzer::{BatchSummary, DataFlowAnalyzer};
