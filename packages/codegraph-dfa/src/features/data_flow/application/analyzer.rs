/*
 * Data Flow Analyzer
 *
 * Use case entry point: analyze one method, or a batch of independent
 * methods on a rayon pool.
 *
 * Each method gets its own DataFlowRunner; nothing mutable is shared
 * between runs except the diagnostics sink. Cancellation is scoped to one
 * call: `analyze`/`analyze_all` run under a fresh token, the `_cancellable`
 * variants under the caller's.
 *
 * # Example
 * ```rust,ignore
 * let analyzer = DataFlowAnalyzer::new(DataFlowConfig::default(), Arc::new(hierarchy))?;
 * let report = analyzer.analyze("Foo.bar", &flow);
 * for defect in &report.defects {
 *     println!("{}", defect);
 * }
 * ```
 */

use crate::config::{ConfigResult, DataFlowConfig, Validatable};
use crate::features::data_flow::domain::{AnalysisReport, RunStatus};
use crate::features::data_flow::infrastructure::{
    CancellationToken, ControlFlow, DataFlowRunner, TracingDiagnostics,
};
use crate::features::data_flow::ports::{DiagnosticSink, TypeHierarchy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use tracing::warn;

/// Outcome counts of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub methods: usize,
    pub completed: usize,
    pub too_complex: usize,
    pub cancelled: usize,
    pub aborted: usize,
    pub defects: usize,
    pub processed_states: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[AnalysisReport]) -> Self {
        let mut summary = Self {
            methods: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status {
                RunStatus::Completed => summary.completed += 1,
                RunStatus::TooComplex { .. } => summary.too_complex += 1,
                RunStatus::Cancelled => summary.cancelled += 1,
                RunStatus::Aborted { .. } => summary.aborted += 1,
            }
            summary.defects += report.defects.len();
            summary.processed_states += report.stats.processed_states;
        }
        summary
    }
}

/// Per-method and batch data flow analysis
pub struct DataFlowAnalyzer {
    config: DataFlowConfig,
    hierarchy: Arc<dyn TypeHierarchy>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl DataFlowAnalyzer {
    /// Create an analyzer; the configuration is validated here
    pub fn new(config: DataFlowConfig, hierarchy: Arc<dyn TypeHierarchy>) -> ConfigResult<Self> {
        config.validate()?;
        debug!(config = %config.describe(), "data flow analyzer initialized");
        Ok(Self {
            config,
            hierarchy,
            diagnostics: Arc::new(TracingDiagnostics),
        })
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn config(&self) -> &DataFlowConfig {
        &self.config
    }

    /// Analyze a single method
    pub fn analyze(&self, method: &str, flow: &ControlFlow) -> AnalysisReport {
        self.analyze_cancellable(method, flow, &CancellationToken::new())
    }

    /// Analyze a single method; `token` may be cancelled from another thread
    pub fn analyze_cancellable(
        &self,
        method: &str,
        flow: &ControlFlow,
        token: &CancellationToken,
    ) -> AnalysisReport {
        DataFlowRunner::new(flow, &*self.hierarchy, self.config.clone())
            .with_cancellation(token.clone())
            .with_diagnostics(Arc::clone(&self.diagnostics))
            .run(method)
    }

    /// Analyze independent methods; reports come back in input order
    pub fn analyze_all(&self, methods: &[(String, ControlFlow)]) -> Vec<AnalysisReport> {
        self.analyze_all_cancellable(methods, &CancellationToken::new())
    }

    /// Batch under one token: cancelling it stops every method of this
    /// batch that has not finished yet
    pub fn analyze_all_cancellable(
        &self,
        methods: &[(String, ControlFlow)],
        token: &CancellationToken,
    ) -> Vec<AnalysisReport> {
        info!(methods = methods.len(), "data flow batch started");

        let reports = self.run_batch(methods, token);

        let summary = BatchSummary::from_reports(&reports);
        info!(
            completed = summary.completed,
            too_complex = summary.too_complex,
            aborted = summary.aborted,
            cancelled = summary.cancelled,
            defects = summary.defects,
            "data flow batch finished"
        );
        reports
    }

    #[cfg(feature = "parallel")]
    fn run_batch(
        &self,
        methods: &[(String, ControlFlow)],
        token: &CancellationToken,
    ) -> Vec<AnalysisReport> {
        if !self.config.parallel || methods.len() < 2 {
            return self.run_sequential(methods, token);
        }

        let threads = self.config.effective_threads();
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| {
                methods
                    .par_iter()
                    .map(|(name, flow)| self.analyze_cancellable(name, flow, token))
                    .collect()
            }),
            Err(err) => {
                warn!(threads, "rayon pool unavailable, running sequentially: {}", err);
                self.run_sequential(methods, token)
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_batch(
        &self,
        methods: &[(String, ControlFlow)],
        token: &CancellationToken,
    ) -> Vec<AnalysisReport> {
        self.run_sequential(methods, token)
    }

    fn run_sequential(
        &self,
        methods: &[(String, ControlFlow)],
        token: &CancellationToken,
    ) -> Vec<AnalysisReport> {
        methods
            .iter()
            .map(|(name, flow)| self.analyze_cancellable(name, flow, token))
            .collect()
    }
}
