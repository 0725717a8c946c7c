//! Terminal dialogs
//!
//! Questions go to stderr and answers come from stdin. Answers given on the
//! command line are used without asking.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use mcpide::{DialogKind, DialogOutcome, DialogSpec, Dialogs, PromptSpec};
use tracing::warn;

#[derive(Debug, Default)]
pub struct ConsoleDialogs {
  /// Answer every confirmation with yes
  assume_yes: bool,
  /// Pre-supplied answer for the rename prompt
  answer: Option<String>,
}

impl ConsoleDialogs {
  pub fn new(assume_yes: bool, answer: Option<String>) -> Self {
    Self { assume_yes, answer }
  }
}

#[async_trait]
impl Dialogs for ConsoleDialogs {
  async fn show(&self, spec: DialogSpec) -> DialogOutcome {
    match spec.kind {
      DialogKind::Error => {
        eprintln!("error: {}: {}", spec.title, spec.message);
        DialogOutcome::Dismissed
      }
      DialogKind::Confirmation if self.assume_yes => DialogOutcome::Confirmed,
      DialogKind::Confirmation => {
        let question = format!("{}: {} [y/N] ", spec.title, spec.message);
        match ask(question).await {
          Some(line) => parse_confirmation(&line),
          None => DialogOutcome::Dismissed,
        }
      }
    }
  }

  async fn prompt(&self, spec: PromptSpec) -> Option<String> {
    if let Some(answer) = &self.answer {
      return Some(answer.clone());
    }

    let question = format!("{}: {} [{}] ", spec.title, spec.message, spec.initial);
    let line = ask(question).await?;
    let line = line.trim();
    if line.is_empty() {
      Some(spec.initial)
    } else {
      Some(line.to_string())
    }
  }
}

fn parse_confirmation(line: &str) -> DialogOutcome {
  match line.trim().to_lowercase().as_str() {
    "y" | "yes" => DialogOutcome::Confirmed,
    _ => DialogOutcome::Cancelled,
  }
}

/// Print `question` and read one line; `None` on end of input
async fn ask(question: String) -> Option<String> {
  let read = tokio::task::spawn_blocking(move || {
    let mut stderr = std::io::stderr();
    write!(stderr, "{question}")?;
    stderr.flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    Ok::<_, std::io::Error>((read > 0).then_some(line))
  })
  .await;

  match read {
    Ok(Ok(line)) => line,
    Ok(Err(e)) => {
      warn!(error = %e, "Failed to read answer");
      None
    }
    Err(e) => {
      warn!(error = %e, "Prompt task failed");
      None
    }
  }
}
