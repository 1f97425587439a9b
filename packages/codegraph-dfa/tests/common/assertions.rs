//! Custom assertions for test verification

use codegraph_dfa::{AnalysisReport, DefectKind, SourceAnchor};

/// Assert that the run completed without findings
pub fn assert_clean(report: &AnalysisReport) {
    assert!(
        report.is_clean(),
        "Expected a clean completed run, got {:?} with defects: {:?}",
        report.status,
        report.defects
    );
}

/// Assert the exact set of findings as (kind, anchor) pairs, in report order
pub fn assert_defects(report: &AnalysisReport, expected: &[(DefectKind, SourceAnchor)]) {
    assert!(
        report.status.is_completed(),
        "Expected a completed run, got {:?}",
        report.status
    );
    let actual: Vec<_> = report
        .defects
        .iter()
        .map(|d| (d.kind, d.anchor.expect("reported defects carry anchors")))
        .collect();
    pretty_assertions::assert_eq!(actual, expected);
}

/// Assert a single finding of `kind` at `anchor`, ignoring other kinds
pub fn assert_has_defect(report: &AnalysisReport, kind: DefectKind, anchor: SourceAnchor) {
    assert!(
        report
            .defects_of(kind)
            .any(|d| d.anchor == Some(anchor)),
        "Expected {} at {}, got: {:?}",
        kind,
        anchor,
        report.defects
    );
}
