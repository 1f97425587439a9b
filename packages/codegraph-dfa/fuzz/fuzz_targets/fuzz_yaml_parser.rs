#![no_main]

use codegraph_dfa::{DataFlowConfig, Validatable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        // Anything that loads must validate and survive an export cycle
        if let Ok(config) = DataFlowConfig::from_yaml_str(yaml_str) {
            assert!(config.validate().is_ok());
            let yaml = config.to_yaml().expect("export");
            assert_eq!(DataFlowConfig::from_yaml_str(&yaml).ok(), Some(config));
        }
    }
});
