//! Compiled-template cache.
//!
//! Population is single-flight per identifier: concurrent first requests
//! for one identifier collapse into a single compilation whose result (or
//! error) every waiter shares, while unrelated identifiers compile fully
//! in parallel. A failed compilation publishes nothing, so a later fresh
//! request retries.

use crate::error::Result;
use crate::template::CompiledTemplate;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Outcome = Result<Arc<CompiledTemplate>>;
type Gate = Arc<Mutex<Option<Outcome>>>;

pub(crate) struct TemplateCache {
    compiled: DashMap<String, Arc<CompiledTemplate>>,
    in_flight: DashMap<String, Gate>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self {
            compiled: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledTemplate>> {
        self.compiled.get(name).map(|entry| Arc::clone(&entry))
    }

    pub fn get_or_compile(
        &self,
        name: &str,
        compile: impl FnOnce() -> Outcome,
    ) -> Outcome {
        if let Some(template) = self.get(name) {
            log::debug!("template cache hit: {name}");
            return Ok(template);
        }

        let gate = self
            .in_flight
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut slot = gate.lock().unwrap_or_else(PoisonError::into_inner);

        // A waiter that blocked on the gate shares the leader's outcome,
        // error included.
        if let Some(outcome) = slot.as_ref() {
            return outcome.clone();
        }
        // The gate may be fresh while an earlier flight already published.
        if let Some(template) = self.get(name) {
            return Ok(template);
        }

        let outcome = compile();
        if let Ok(template) = &outcome {
            self.compiled.insert(name.to_string(), Arc::clone(template));
        }
        *slot = Some(outcome.clone());
        // Later requests start a fresh flight; only contemporaries share
        // this gate.
        self.in_flight.remove(name);
        outcome
    }

    pub fn invalidate(&self, name: &str) -> bool {
        self.compiled.remove(name).is_some()
    }

    pub fn clear(&self) {
        self.compiled.clear();
    }
}
