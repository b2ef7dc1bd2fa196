//! Per-chart loading lifecycle.
//!
//! Every chart goes through the same states while its data is fetched:
//! idle, loading, then one of error, empty or ready. `FetchState` holds that
//! lifecycle once so chart code only supplies the ready-state renderer.
//! Each `begin` hands out a generation number; results settled with an older
//! generation are dropped, so a slow response for a previous language or year
//! never overwrites a newer one.

use log::debug;
use std::fmt::Display;

/// Monotonic token identifying one fetch attempt of one chart.
pub type Generation = u64;

/// Whether a successfully fetched result has anything to show.
pub trait EmptyResult {
    fn is_empty_result(&self) -> bool;
}

impl<T> EmptyResult for Vec<T> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<T> EmptyResult for [T] {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<A: EmptyResult, B: EmptyResult> EmptyResult for (A, B) {
    fn is_empty_result(&self) -> bool {
        self.0.is_empty_result() && self.1.is_empty_result()
    }
}

impl EmptyResult for crate::payload::DataPayload {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl EmptyResult for crate::payload::Metadata {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub enum FetchPhase<T> {
    #[default]
    Idle,
    Loading,
    Error(String),
    Empty,
    Ready(T),
}

/// Outcome of offering a result to a [`FetchState`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Settled {
    Applied,
    /// A newer fetch was started after this one; the result was discarded.
    Stale,
}

#[derive(Debug, Clone)]
pub struct FetchState<T> {
    phase: FetchPhase<T>,
    generation: Generation,
}

impl<T: EmptyResult> FetchState<T> {
    pub fn new() -> Self {
        FetchState {
            phase: FetchPhase::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> &FetchPhase<T> {
        &self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, FetchPhase::Loading)
    }

    /// Start a new fetch. Any fetch still in flight becomes stale.
    pub fn begin(&mut self) -> Generation {
        self.generation += 1;
        self.phase = FetchPhase::Loading;
        self.generation
    }

    /// Apply the result of the fetch started with `generation`.
    pub fn settle<E: Display>(&mut self, generation: Generation, result: Result<T, E>) -> Settled {
        if generation != self.generation || !self.is_loading() {
            debug!(
                "Discarding stale result for generation {} (current {})",
                generation, self.generation
            );
            return Settled::Stale;
        }
        self.phase = match result {
            Err(e) => FetchPhase::Error(e.to_string()),
            Ok(value) if value.is_empty_result() => FetchPhase::Empty,
            Ok(value) => FetchPhase::Ready(value),
        };
        Settled::Applied
    }

    /// Return to idle, invalidating anything in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = FetchPhase::Idle;
    }

    pub fn ready(&self) -> Option<&T> {
        match &self.phase {
            FetchPhase::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Produce a view for the current phase. Only the ready renderer is chart
    /// specific; the other phases use the supplied shared views.
    pub fn view<V>(&self, views: &PhaseViews<V>, on_ready: impl FnOnce(&T) -> V) -> V
    where
        V: Clone,
    {
        match &self.phase {
            FetchPhase::Idle | FetchPhase::Loading => views.loading.clone(),
            FetchPhase::Error(message) => (views.error)(message),
            FetchPhase::Empty => views.empty.clone(),
            FetchPhase::Ready(value) => on_ready(value),
        }
    }
}

/// Views shared by every chart for its non-ready phases.
pub struct PhaseViews<V> {
    pub loading: V,
    pub empty: V,
    pub error: Box<dyn Fn(&str) -> V>,
}

/// Combine the results of a concurrently issued fetch group. The group fails
/// with the first error; otherwise every value is returned in order.
pub fn join_settled<T, E>(results: Vec<Result<T, E>>) -> Result<Vec<T>, E> {
    results.into_iter().collect()
}
