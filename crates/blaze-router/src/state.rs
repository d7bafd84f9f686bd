//! Navigation state
//!
//! Current and last-good route, the in-flight ticket and per-route attempt
//! counters. Counters live for the session: a route that reaches the
//! ceiling stays unreachable until the router is rebuilt.

use std::collections::HashMap;

/// Default retry ceiling per route
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Handle for one in-flight load
///
/// Only the ticket matching the router's current generation may settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    route: String,
    path: String,
    attempt: u32,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Resource path being fetched
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 1-based attempt number for this route
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Router status for one session
#[derive(Debug, Clone)]
pub struct NavigationState {
    current: Option<String>,
    last_valid: Option<String>,
    in_flight: Option<Ticket>,
    attempts: HashMap<String, u32>,
    failures: HashMap<String, u32>,
    max_attempts: u32,
    generation: u64,
}

impl NavigationState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            current: None,
            last_valid: None,
            in_flight: None,
            attempts: HashMap::new(),
            failures: HashMap::new(),
            max_attempts: max_attempts.max(1),
            generation: 0,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn last_valid(&self) -> Option<&str> {
        self.last_valid.as_deref()
    }

    /// Seed the fallback route (from durable storage)
    pub fn set_last_valid(&mut self, route: &str) {
        self.last_valid = Some(route.to_string());
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    // === Attempts ===

    /// Count a new attempt, or refuse when the route is at its ceiling
    pub fn begin_attempt(&mut self, route: &str) -> Option<u32> {
        let count = self.attempts.entry(route.to_string()).or_insert(0);
        if *count >= self.max_attempts {
            return None;
        }
        *count += 1;
        Some(*count)
    }

    /// Route loaded: clear its counter and make it current
    pub fn record_success(&mut self, route: &str) {
        self.attempts.remove(route);
        self.failures.remove(route);
        self.current = Some(route.to_string());
        self.last_valid = Some(route.to_string());
    }

    /// Route failed: the attempt stays counted
    pub fn record_failure(&mut self, route: &str) {
        let failures = {
            let count = self.failures.entry(route.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        tracing::debug!(
            "Recorded failure {} for {} ({}/{} attempts)",
            failures,
            route,
            self.attempts(route),
            self.max_attempts
        );
    }

    /// Consecutive failures since the route last loaded
    pub fn failures(&self, route: &str) -> u32 {
        self.failures.get(route).copied().unwrap_or(0)
    }

    /// Withdraw an attempt that was superseded before it settled
    pub fn cancel_attempt(&mut self, route: &str) {
        if let Some(count) = self.attempts.get_mut(route) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn is_at_retry_limit(&self, route: &str) -> bool {
        self.attempts(route) >= self.max_attempts
    }

    pub fn attempts(&self, route: &str) -> u32 {
        self.attempts.get(route).copied().unwrap_or(0)
    }

    // === In-flight navigation ===

    pub fn is_navigating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&Ticket> {
        self.in_flight.as_ref()
    }

    /// Issue the ticket for a new load
    pub(crate) fn start(&mut self, route: &str, path: &str, attempt: u32) -> Ticket {
        self.generation += 1;
        let ticket = Ticket {
            generation: self.generation,
            route: route.to_string(),
            path: path.to_string(),
            attempt,
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Invalidate the in-flight ticket, returning it
    pub(crate) fn supersede(&mut self) -> Option<Ticket> {
        let old = self.in_flight.take()?;
        self.cancel_attempt(&old.route);
        Some(old)
    }

    /// Drop the in-flight ticket if `ticket` is it, withdrawing its attempt
    pub(crate) fn abandon(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = None;
        self.cancel_attempt(&ticket.route);
        true
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|t| t.generation == ticket.generation)
    }

    /// Clear the in-flight ticket if `ticket` is it
    pub(crate) fn finish(&mut self, ticket: &Ticket) -> bool {
        if self.is_current(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
