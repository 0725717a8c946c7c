//! Shared test doubles for the highlight, surface and session tests.

use std::{
  collections::{HashSet, VecDeque},
  sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use async_trait::async_trait;
use mcpide_parser::{LexicalResolver, ResolveError, SymbolOccurrence, SymbolResolver};
use tokio::sync::Notify;

use crate::ui::{DialogOutcome, DialogSpec, Dialogs, PromptSpec};

// ============================================================================
// ScriptedDialogs
// ============================================================================

/// Dialogs answering from a script; unscripted dialogs are dismissed
#[derive(Default)]
pub struct ScriptedDialogs {
  outcomes: Mutex<VecDeque<DialogOutcome>>,
  answers: Mutex<VecDeque<Option<String>>>,
  shown: Mutex<Vec<DialogSpec>>,
  prompts: Mutex<Vec<PromptSpec>>,
  /// While set, `show` records the dialog and then waits for `answer_held`
  held: Mutex<bool>,
  answered: Notify,
}

impl ScriptedDialogs {
  pub fn push_outcome(&self, outcome: DialogOutcome) {
    self.outcomes.lock().unwrap().push_back(outcome);
  }

  pub fn push_answer(&self, answer: Option<&str>) {
    self.answers.lock().unwrap().push_back(answer.map(str::to_string));
  }

  pub fn shown(&self) -> Vec<DialogSpec> {
    self.shown.lock().unwrap().clone()
  }

  pub fn prompts(&self) -> Vec<PromptSpec> {
    self.prompts.lock().unwrap().clone()
  }

  /// Keep shown dialogs open until [`ScriptedDialogs::answer_held`]
  pub fn hold(&self) {
    *self.held.lock().unwrap() = true;
  }

  pub fn answer_held(&self) {
    *self.held.lock().unwrap() = false;
    self.answered.notify_waiters();
  }
}

#[async_trait]
impl Dialogs for ScriptedDialogs {
  async fn show(&self, spec: DialogSpec) -> DialogOutcome {
    self.shown.lock().unwrap().push(spec);
    loop {
      let answered = self.answered.notified();
      if !*self.held.lock().unwrap() {
        break;
      }
      answered.await;
    }
    self
      .outcomes
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or(DialogOutcome::Dismissed)
  }

  async fn prompt(&self, spec: PromptSpec) -> Option<String> {
    self.prompts.lock().unwrap().push(spec);
    self.answers.lock().unwrap().pop_front().flatten()
  }
}

// ============================================================================
// GatedResolver
// ============================================================================

/// Lexical resolver that blocks while closed and can be told to fail
#[derive(Default)]
pub struct GatedResolver {
  gate: Mutex<Gate>,
  changed: Condvar,
  calls: AtomicUsize,
  finished: AtomicUsize,
  fail_on: Mutex<Option<String>>,
}

#[derive(Default)]
struct Gate {
  open: bool,
  /// Sources that stay blocked even while open
  held: HashSet<String>,
}

impl GatedResolver {
  pub fn closed() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn open() -> Arc<Self> {
    let resolver = Self::default();
    resolver.gate.lock().unwrap().open = true;
    Arc::new(resolver)
  }

  pub fn release(&self) {
    self.gate.lock().unwrap().open = true;
    self.changed.notify_all();
  }

  /// Block resolving exactly `text` until [`GatedResolver::release_text`]
  pub fn hold_text(&self, text: &str) {
    self.gate.lock().unwrap().held.insert(text.to_string());
  }

  pub fn release_text(&self, text: &str) {
    self.gate.lock().unwrap().held.remove(text);
    self.changed.notify_all();
  }

  /// Sources containing `marker` make the resolver panic
  pub fn panic_on(&self, marker: &str) {
    *self.fail_on.lock().unwrap() = Some(marker.to_string());
  }

  /// Resolves started so far
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Resolves that got past the gate and returned
  pub fn finished(&self) -> usize {
    self.finished.load(Ordering::SeqCst)
  }
}

impl SymbolResolver for GatedResolver {
  fn resolve(&self, text: &str) -> Result<Vec<SymbolOccurrence>, ResolveError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let mut gate = self.gate.lock().unwrap();
    while !gate.open || gate.held.contains(text) {
      gate = self.changed.wait(gate).unwrap();
    }
    drop(gate);

    let marker = self.fail_on.lock().unwrap().clone();
    if let Some(marker) = marker
      && text.contains(&marker)
    {
      panic!("resolver failure on {marker}");
    }
    let resolved = LexicalResolver.resolve(text);
    self.finished.fetch_add(1, Ordering::SeqCst);
    resolved
  }
}
