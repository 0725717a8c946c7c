//! Per-surface edit generations
//!
//! Every text submission advances the surface's generation. A computation
//! carries the ticket it was started with and may only apply its result while
//! that ticket is still current.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

/// Monotonic generation counter shared by everyone submitting to one surface
#[derive(Debug, Clone, Default)]
pub struct EditGeneration(Arc<AtomicU64>);

impl EditGeneration {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start a new generation, superseding every outstanding ticket.
  pub fn advance(&self) -> GenerationTicket {
    let generation = self.0.fetch_add(1, Ordering::AcqRel) + 1;
    GenerationTicket {
      generation,
      counter: self.clone(),
    }
  }

  /// The most recently issued generation (0 before any submission)
  pub fn current(&self) -> u64 {
    self.0.load(Ordering::Acquire)
  }
}

/// Proof of the generation a computation belongs to
#[derive(Debug, Clone)]
pub struct GenerationTicket {
  generation: u64,
  counter: EditGeneration,
}

impl GenerationTicket {
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Exact match only: a newer submission makes this ticket stale for good.
  pub fn is_current(&self) -> bool {
    self.counter.current() == self.generation
  }
}
