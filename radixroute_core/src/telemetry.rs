//! Minimal run‑time metrics sink.
//!
//! Prometheus export is intentionally left out; instead the host process may
//! register a raw callback that receives name/value pairs for every counter
//! increment and gauge update the router emits.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Recorder, SharedString, Unit};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Signature for external collectors. `name` is UTF-8 and *not* NUL-terminated.
pub type StatsCallback = unsafe extern "C" fn(name: *const u8, name_len: usize, value: u64);

static CALLBACK: OnceCell<StatsCallback> = OnceCell::new();

/// Register a callback from C/other languages and install the forwarding
/// recorder. Only the first registration wins.
///
/// # Safety
/// `cb` must stay callable for the rest of the process and must tolerate
/// being invoked concurrently from any thread.
#[no_mangle]
pub unsafe extern "C" fn radixroute_register_stats_callback(cb: StatsCallback) {
    let _ = CALLBACK.set(cb);
    init();
}

fn forward(key: &Key, value: u64) {
    if let Some(cb) = CALLBACK.get() {
        let name = key.name();
        unsafe { cb(name.as_ptr(), name.len(), value) };
    }
}

/// Forwarding recorder. Uses the callback **if** it was registered.
struct FfiRecorder;

#[derive(Clone)]
struct FfiMetric {
    key: Key,
}

impl Recorder for FfiRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &metrics::Metadata<'_>) -> Counter {
        Counter::from_arc(Arc::new(FfiMetric { key: key.clone() }))
    }
    fn register_gauge(&self, key: &Key, _metadata: &metrics::Metadata<'_>) -> Gauge {
        Gauge::from_arc(Arc::new(FfiMetric { key: key.clone() }))
    }
    fn register_histogram(&self, key: &Key, _metadata: &metrics::Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(FfiMetric { key: key.clone() }))
    }
}

impl metrics::CounterFn for FfiMetric {
    fn increment(&self, value: u64) {
        forward(&self.key, value);
    }
    fn absolute(&self, value: u64) {
        forward(&self.key, value);
    }
}

impl metrics::GaugeFn for FfiMetric {
    fn set(&self, value: f64) {
        forward(&self.key, value as u64);
    }
    fn increment(&self, value: f64) {
        forward(&self.key, value as u64);
    }
    fn decrement(&self, value: f64) {
        forward(&self.key, value as u64);
    }
}

impl metrics::HistogramFn for FfiMetric {
    fn record(&self, value: f64) {
        forward(&self.key, value as u64);
    }
}

/// Install exactly **once**. Leaves an already installed host recorder alone.
pub fn init() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = metrics::set_global_recorder(FfiRecorder);
    });
}
