#![allow(dead_code)]
use tether::backend::mock::Call;
use tether::target::Slot;
use tether::{Context, ContextConfig, MockBackend};
use tracing_subscriber::EnvFilter;

/// Installs a subscriber that logs to the test output. Set `RUST_LOG` to see the logs.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A context over a mock backend, and a handle on the backend to inspect it.
pub struct Fixture {
    pub gl: Context,
    pub mock: MockBackend,
}

impl Fixture {
    pub fn new() -> Fixture {
        Fixture::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Fixture {
        init_logging();
        let mock = MockBackend::new();
        let gl = Context::with_config(mock.clone(), config);
        Fixture { gl, mock }
    }

    /// Number of bind calls recorded on a slot.
    pub fn bind_count(&self, slot: Slot) -> usize {
        self.mock.binds().iter().filter(|(s, _)| *s == slot).count()
    }

    /// Number of binding queries recorded on a slot.
    pub fn query_count(&self, slot: Slot) -> usize {
        self.mock
            .calls()
            .iter()
            .filter(|call| **call == Call::QueryBinding(slot))
            .count()
    }
}
