//! Scripted power adapter for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{ActuationError, PowerControl, PowerSource};

/// Scripted power adapter.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// loop.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockPower {
    inner: Arc<Mutex<MockPowerInner>>,
}

#[derive(Debug, Default)]
struct MockPowerInner {
    /// Current state, `None` for an unsupported display
    state: Option<bool>,
    /// Readings returned before falling back to `state`
    readings: VecDeque<Option<bool>>,
    /// Number of `set_power` calls before writes take effect, `None` for never
    applies_after: Option<usize>,
    /// Every value passed to `set_power`
    set_calls: Vec<bool>,
    /// Number of `get_power` calls
    get_calls: usize,
    /// Make every `set_power` report failure
    fail_sets: bool,
}

impl MockPower {
    /// Adapter whose writes take effect immediately.
    pub fn new(state: Option<bool>) -> Self {
        let mock = Self::default();
        {
            let mut inner = mock.inner.lock().unwrap();
            inner.state = state;
            inner.applies_after = Some(1);
        }
        mock
    }

    /// Queue readings returned by the next `get_power()` calls.
    pub fn with_readings(self, readings: impl IntoIterator<Item = Option<bool>>) -> Self {
        self.inner.lock().unwrap().readings.extend(readings);
        self
    }

    /// Writes only take effect from the `k`-th `set_power` call on.
    pub fn converging_after(self, k: usize) -> Self {
        self.inner.lock().unwrap().applies_after = Some(k);
        self
    }

    /// Writes never take effect.
    pub fn never_converging(self) -> Self {
        self.inner.lock().unwrap().applies_after = None;
        self
    }

    /// Every `set_power` returns an error (writes may still take effect).
    pub fn failing_sets(self) -> Self {
        self.inner.lock().unwrap().fail_sets = true;
        self
    }

    pub fn state(&self) -> Option<bool> {
        self.inner.lock().unwrap().state
    }

    pub fn set_calls(&self) -> Vec<bool> {
        self.inner.lock().unwrap().set_calls.clone()
    }

    pub fn get_calls(&self) -> usize {
        self.inner.lock().unwrap().get_calls
    }
}

impl PowerSource for MockPower {
    async fn get_power(&mut self) -> Option<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.get_calls += 1;
        match inner.readings.pop_front() {
            Some(reading) => reading,
            None => inner.state,
        }
    }
}

impl PowerControl for MockPower {
    async fn set_power(&mut self, on: bool) -> Result<(), ActuationError> {
        let mut inner = self.inner.lock().unwrap();
        inner.set_calls.push(on);

        let applied = matches!(inner.applies_after, Some(k) if inner.set_calls.len() >= k);
        if applied && inner.state.is_some() {
            inner.state = Some(on);
        }

        if inner.fail_sets {
            Err(ActuationError::CommandFailed("mock failure".into()))
        } else {
            Ok(())
        }
    }
}
