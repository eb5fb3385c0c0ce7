//! Shared fixtures for the integration tests

#![allow(dead_code)]

use lingua_core::{Bridge, BridgeOptions, HostEnvironment, HostValue, OwnershipPolicy};

pub struct TestHost;

impl HostEnvironment for TestHost {
    fn exception_base(&self, name: &str) -> Option<String> {
        Some(format!("builtins.{}", name))
    }
}

/// Bridge reporting ownership violations as errors
pub fn bridge() -> Bridge {
    let _ = env_logger::builder().is_test(true).try_init();
    lingua_icu::init_module_with(
        &TestHost,
        BridgeOptions::new().with_ownership_policy(OwnershipPolicy::Leak),
    )
    .unwrap()
}

pub fn call(bridge: &Bridge, this: &HostValue, method: &str, args: &[HostValue]) -> HostValue {
    bridge.call_method(this, method, args).unwrap()
}

pub fn text(value: &HostValue) -> &str {
    value.as_str().unwrap()
}

pub fn locale(bridge: &Bridge, name: &str) -> HostValue {
    bridge.construct("Locale", &[HostValue::str(name)]).unwrap()
}

pub fn unicode_string(bridge: &Bridge, text: &str) -> HostValue {
    bridge.construct("UnicodeString", &[HostValue::str(text)]).unwrap()
}
