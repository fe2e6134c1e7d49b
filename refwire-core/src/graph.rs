use std::collections::{HashMap, HashSet};

/// Tracks which in-flight request is waiting on which other request.
///
/// An edge `waiter -> target` exists while the hydration of `waiter` is
/// awaiting the outcome of `target`. Edges are counted, since one body can
/// reference the same URI from several fields at once.
#[derive(Debug, Default)]
pub struct RequestGraph {
    waits_on: HashMap<String, HashMap<String, usize>>,
}

impl RequestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `waiter` waits on `target`.
    pub fn add_dependency(&mut self, waiter: &str, target: &str) {
        *self
            .waits_on
            .entry(waiter.to_string())
            .or_default()
            .entry(target.to_string())
            .or_default() += 1;
    }

    pub fn remove_dependency(&mut self, waiter: &str, target: &str) {
        let Some(targets) = self.waits_on.get_mut(waiter) else {
            return;
        };
        if let Some(count) = targets.get_mut(target) {
            *count -= 1;
            if *count == 0 {
                targets.remove(target);
            }
        }
        if targets.is_empty() {
            self.waits_on.remove(waiter);
        }
    }

    pub fn dependencies_of(&self, waiter: &str) -> Vec<&str> {
        self.waits_on
            .get(waiter)
            .map(|targets| targets.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether `waiter -> target` would close a cycle, i.e. `target`
    /// already (transitively) waits on `waiter`.
    pub fn would_create_cycle(&self, waiter: &str, target: &str) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![target];

        while let Some(current) = stack.pop() {
            if current == waiter {
                return true;
            }
            if visited.insert(current) {
                if let Some(next) = self.waits_on.get(current) {
                    stack.extend(next.keys().map(String::as_str));
                }
            }
        }

        false
    }

    pub fn is_empty(&self) -> bool {
        self.waits_on.is_empty()
    }
}
