//! Query parameters.

use std::collections::BTreeMap;
use std::time::Duration;

/// Query parameters of a request, keyed by wire name.
///
/// Setting a parameter twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Set a duration parameter in the engine's time unit syntax.
    pub fn set_time(&mut self, key: impl Into<String>, value: Duration) {
        self.set(key, time_value(value));
    }

    /// Set a boolean parameter.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, value.to_string());
    }

    /// Get a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters as ordered key/value pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Parameters carrying the usual `master_timeout` and `timeout` pair.
pub(crate) fn timeouts(master_timeout: Option<Duration>, timeout: Option<Duration>) -> RequestParams {
    let mut params = RequestParams::new();
    if let Some(t) = master_timeout {
        params.set_time("master_timeout", t);
    }
    if let Some(t) = timeout {
        params.set_time("timeout", t);
    }
    params
}

/// Render a duration with the largest unit that represents it exactly.
pub fn time_value(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis == 0 {
        return "0ms".to_string();
    }
    for (unit, size) in [("d", 86_400_000), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)] {
        if millis % size == 0 {
            return format!("{}{}", millis / size, unit);
        }
    }
    format!("{}ms", millis)
}
