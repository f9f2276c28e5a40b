//! Lifecycle listeners.
//!
//! Listeners observe four protocol points: parsing started, compilation
//! finished, rendering started and rendering finished. The first three
//! dispatch in registration order; `rendering_finished` dispatches in
//! reverse order, so a listener that acquires a resource in
//! `rendering_started` releases it in strict LIFO nesting relative to the
//! other listeners. A listener error aborts the remaining chain for that
//! event and propagates to the caller.

use crate::error::{Error, Result};
use crate::template::CompiledTemplate;
use std::sync::Arc;

pub struct ParsingEvent {
    template_name: String,
}

impl ParsingEvent {
    pub(crate) fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
        }
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }
}

pub struct CompilationEvent {
    template: Arc<CompiledTemplate>,
}

impl CompilationEvent {
    pub(crate) fn new(template: Arc<CompiledTemplate>) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Arc<CompiledTemplate> {
        &self.template
    }
}

type ReleaseCallback = Box<dyn FnOnce() + Send>;

pub struct RenderingEvent {
    template_name: String,
    release_callbacks: Vec<ReleaseCallback>,
}

impl RenderingEvent {
    pub(crate) fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            release_callbacks: Vec::new(),
        }
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Register a callback that runs when the render call exits, on both
    /// the success and the failure path, in reverse registration order.
    pub fn register_release_callback(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.release_callbacks.push(Box::new(callback));
    }

    pub(crate) fn run_release_callbacks(&mut self) {
        while let Some(callback) = self.release_callbacks.pop() {
            callback();
        }
    }
}

/// Receives notifications about template processing. All callbacks
/// default to no-ops; implement only the points of interest.
pub trait EngineListener: Send + Sync {
    fn parsing_started(&self, _event: &ParsingEvent) -> Result<()> {
        Ok(())
    }

    fn compilation_finished(&self, _event: &CompilationEvent) -> Result<()> {
        Ok(())
    }

    fn rendering_started(&self, _event: &mut RenderingEvent) -> Result<()> {
        Ok(())
    }

    fn rendering_finished(&self, _event: &mut RenderingEvent) -> Result<()> {
        Ok(())
    }

    /// Checked once before registration; an invalid listener is excluded
    /// from the active set and never invoked.
    fn is_valid(&self) -> bool {
        true
    }
}

/// The ordered, immutable set of active listeners.
pub(crate) struct Listeners {
    listeners: Vec<Arc<dyn EngineListener>>,
}

impl Listeners {
    pub fn new(candidates: Vec<Arc<dyn EngineListener>>) -> Self {
        let listeners = candidates
            .into_iter()
            .filter(|listener| {
                let valid = listener.is_valid();
                if !valid {
                    log::warn!("excluding invalid listener from the active set");
                }
                valid
            })
            .collect();
        Self { listeners }
    }

    pub fn parsing_started(&self, event: &ParsingEvent) -> Result<()> {
        for listener in &self.listeners {
            listener.parsing_started(event)?;
        }
        Ok(())
    }

    pub fn compilation_finished(&self, event: &CompilationEvent) -> Result<()> {
        for listener in &self.listeners {
            listener.compilation_finished(event)?;
        }
        Ok(())
    }

    /// Dispatch in registration order. Returns how many listeners were
    /// entered and the error that stopped the chain, if any.
    pub fn rendering_started(&self, event: &mut RenderingEvent) -> (usize, Option<Error>) {
        for (index, listener) in self.listeners.iter().enumerate() {
            if let Err(err) = listener.rendering_started(event) {
                return (index, Some(err));
            }
        }
        (self.listeners.len(), None)
    }

    /// Dispatch `rendering_finished` for the first `entered` listeners in
    /// reverse registration order; the first error aborts the rest of the
    /// chain.
    pub fn rendering_finished(&self, entered: usize, event: &mut RenderingEvent) -> Option<Error> {
        for listener in self.listeners[..entered].iter().rev() {
            if let Err(err) = listener.rendering_finished(event) {
                return Some(err);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        id: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        valid: bool,
        fail_on_start: bool,
    }

    impl EngineListener for Recorder {
        fn rendering_started(&self, _event: &mut RenderingEvent) -> Result<()> {
            self.calls.lock().unwrap().push(format!("start:{}", self.id));
            if self.fail_on_start {
                return Err(Error::render("listener failure"));
            }
            Ok(())
        }

        fn rendering_finished(&self, _event: &mut RenderingEvent) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("finish:{}", self.id));
            Ok(())
        }

        fn is_valid(&self) -> bool {
            self.valid
        }
    }

    fn recorder(
        id: &'static str,
        calls: &Arc<Mutex<Vec<String>>>,
        valid: bool,
        fail_on_start: bool,
    ) -> Arc<dyn EngineListener> {
        Arc::new(Recorder {
            id,
            calls: Arc::clone(calls),
            valid,
            fail_on_start,
        })
    }

    #[test]
    fn test_started_in_order_finished_in_reverse() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new(vec![
            recorder("l1", &calls, true, false),
            recorder("l2", &calls, true, false),
        ]);

        let mut event = RenderingEvent::new("t");
        let (entered, err) = listeners.rendering_started(&mut event);
        assert_eq!(entered, 2);
        assert!(err.is_none());
        assert!(listeners.rendering_finished(entered, &mut event).is_none());

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["start:l1", "start:l2", "finish:l2", "finish:l1"]
        );
    }

    #[test]
    fn test_failure_stops_chain_and_unwinds_entered() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new(vec![
            recorder("l1", &calls, true, false),
            recorder("l2", &calls, true, true),
            recorder("l3", &calls, true, false),
        ]);

        let mut event = RenderingEvent::new("t");
        let (entered, err) = listeners.rendering_started(&mut event);
        assert_eq!(entered, 1);
        assert!(err.is_some());
        listeners.rendering_finished(entered, &mut event);

        // l3 never started; only l1 is unwound.
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["start:l1", "start:l2", "finish:l1"]
        );
    }

    #[test]
    fn test_invalid_listener_excluded() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new(vec![recorder("bad", &calls, false, false)]);
        let mut event = RenderingEvent::new("t");
        let (entered, _) = listeners.rendering_started(&mut event);
        assert_eq!(entered, 0);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_release_callbacks_run_lifo() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut event = RenderingEvent::new("t");
        for id in ["a", "b", "c"] {
            let calls = Arc::clone(&calls);
            event.register_release_callback(move || calls.lock().unwrap().push(id.to_string()));
        }
        event.run_release_callbacks();
        assert_eq!(*calls.lock().unwrap(), vec!["c", "b", "a"]);
    }
}
