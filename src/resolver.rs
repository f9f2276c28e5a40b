//! Pluggable value resolution.
//!
//! A resolver attempts to resolve one key segment against one context
//! frame. Resolvers are sorted once at engine build time; the chain
//! consults them in descending priority order and the first `Found` (or
//! `Lambda`) answer wins. A present `null` is a found value, distinct
//! from `NotFound`.

use crate::lambda::Lambda;
use crate::node::KeyPath;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Priority of the built-in object-field resolver.
pub const PRIORITY_MAP: i32 = 10;
/// Priority of the built-in array-index resolver.
pub const PRIORITY_INDEX: i32 = 20;
/// Priority of the lambda-registry resolver.
pub const PRIORITY_LAMBDA: i32 = 100;

/// Outcome of a resolution attempt.
#[derive(Clone)]
pub enum Resolved {
    Found(Value),
    Lambda(Arc<dyn Lambda>),
    NotFound,
}

impl Resolved {
    pub fn is_found(&self) -> bool {
        !matches!(self, Resolved::NotFound)
    }
}

pub trait ValueResolver: Send + Sync {
    /// Resolvers with a higher priority are consulted first.
    fn priority(&self) -> i32;

    fn resolve(&self, frame: &Value, segment: &str) -> Resolved;
}

/// Resolves object fields. A field holding `null` is found.
pub struct MapResolver;

impl ValueResolver for MapResolver {
    fn priority(&self) -> i32 {
        PRIORITY_MAP
    }

    fn resolve(&self, frame: &Value, segment: &str) -> Resolved {
        match frame {
            Value::Object(map) => match map.get(segment) {
                Some(value) => Resolved::Found(value.clone()),
                None => Resolved::NotFound,
            },
            _ => Resolved::NotFound,
        }
    }
}

/// Resolves numeric indexes and `length`/`size` against arrays.
pub struct IndexResolver;

impl ValueResolver for IndexResolver {
    fn priority(&self) -> i32 {
        PRIORITY_INDEX
    }

    fn resolve(&self, frame: &Value, segment: &str) -> Resolved {
        let Value::Array(items) = frame else {
            return Resolved::NotFound;
        };
        match segment {
            "length" | "size" => Resolved::Found(Value::Number(items.len().into())),
            _ => match segment.parse::<usize>() {
                Ok(index) => match items.get(index) {
                    Some(value) => Resolved::Found(value.clone()),
                    None => Resolved::NotFound,
                },
                Err(_) => Resolved::NotFound,
            },
        }
    }
}

/// Surfaces engine-registered lambdas through the chain, regardless of
/// the frame being inspected.
pub struct LambdaResolver {
    lambdas: HashMap<String, Arc<dyn Lambda>>,
}

impl LambdaResolver {
    pub fn new(lambdas: HashMap<String, Arc<dyn Lambda>>) -> Self {
        Self { lambdas }
    }
}

impl ValueResolver for LambdaResolver {
    fn priority(&self) -> i32 {
        PRIORITY_LAMBDA
    }

    fn resolve(&self, _frame: &Value, segment: &str) -> Resolved {
        match self.lambdas.get(segment) {
            Some(lambda) => Resolved::Lambda(Arc::clone(lambda)),
            None => Resolved::NotFound,
        }
    }
}

/// The priority-ordered resolver chain, sorted once at engine build.
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn ValueResolver>>,
}

impl ResolverChain {
    pub fn new(mut resolvers: Vec<Arc<dyn ValueResolver>>) -> Self {
        resolvers.sort_by_key(|r| std::cmp::Reverse(r.priority()));
        Self { resolvers }
    }

    /// Resolve one segment against one frame.
    pub fn resolve_segment(&self, frame: &Value, segment: &str) -> Resolved {
        for resolver in &self.resolvers {
            let outcome = resolver.resolve(frame, segment);
            if outcome.is_found() {
                return outcome;
            }
        }
        Resolved::NotFound
    }

    /// Resolve a full key path against a context stack (top of stack
    /// last). The first segment scans the stack top to bottom; each
    /// further segment resolves against the previous value only. `this`
    /// and `.` short-circuit to the top frame.
    pub fn resolve_path(&self, stack: &[Value], path: &KeyPath) -> Resolved {
        if path.is_self() {
            return match stack.last() {
                Some(top) => Resolved::Found(top.clone()),
                None => Resolved::NotFound,
            };
        }

        let mut segments = path.segments.iter();
        let Some(first) = segments.next() else {
            return Resolved::NotFound;
        };

        let mut current = Resolved::NotFound;
        for frame in stack.iter().rev() {
            let outcome = self.resolve_segment(frame, first);
            if outcome.is_found() {
                current = outcome;
                break;
            }
        }

        for segment in segments {
            let Resolved::Found(value) = current else {
                // Either nothing so far, or a lambda with segments left.
                return Resolved::NotFound;
            };
            current = self.resolve_segment(&value, segment);
        }
        current
    }
}
