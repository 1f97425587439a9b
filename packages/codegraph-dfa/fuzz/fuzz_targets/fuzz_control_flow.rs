#![no_main]

use codegraph_dfa::{ClassHierarchy, ControlFlow, DataFlowConfig, DataFlowRunner};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Untrusted programs may abort a run, never the process
    let Ok(flow) = serde_json::from_slice::<ControlFlow>(data) else {
        return;
    };
    let hierarchy = ClassHierarchy::new();
    let config = DataFlowConfig::default().max_states(10_000);
    let report = DataFlowRunner::new(&flow, &hierarchy, config).run("Fuzz.method");
    if !report.status.is_completed() {
        assert!(report.defects.is_empty());
    }
});
