//! Operation lifecycle tests.
//!
//! Covers status reporting, failure isolation, single-lane operations,
//! cancellation and shutdown.

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use mcpide_core::ActorConfig;
  use pretty_assertions::assert_eq;
  use tokio::sync::mpsc;
  use tokio_util::sync::CancellationToken;

  use crate::{
    actor::{
      __tests__::helpers::{ActorTestContext, EVENT_TIMEOUT, FakeTooling, wait_for},
      handle::SendError,
      message::{Command, OperationKind, StatusUpdate, ViewEvent},
      project::ProjectActor,
    },
    domain::mapping::MappingSnapshot,
  };

  // ==========================================================================
  // Status and Results
  // ==========================================================================

  /// Test: An operation reports progress, its result, then clears its status.
  #[tokio::test]
  async fn test_load_project_reports_status() {
    let mut ctx = ActorTestContext::new();
    ctx.handle.load_project(ctx.project_path()).await.expect("send");

    let first = ctx.wait_for_event(|_| true).await;
    assert_eq!(first, ViewEvent::Status(StatusUpdate::new("Load Project", "In Progress...")));

    let loaded = ctx.wait_for_event(|_| true).await;
    assert_eq!(
      loaded,
      ViewEvent::ProjectLoaded {
        directory: ctx.project_path(),
        decompiled: None,
      }
    );

    let cleared = ctx.wait_for_event(|_| true).await;
    assert_eq!(cleared, ViewEvent::Status(StatusUpdate::new("Load Project", "")));
  }

  /// Test: Relative files resolve against the loaded project.
  #[tokio::test]
  async fn test_open_file_resolves_against_project() {
    let mut ctx = ActorTestContext::new();
    let path = ctx.project_path().join("src/Main.java");
    ctx.tooling.add_source(&path, "class Main {}");
    ctx.load_project().await;

    ctx.handle.open_file("src/Main.java").await.expect("send");
    let opened = ctx
      .wait_for_event(|e| matches!(e, ViewEvent::FileOpened { .. }))
      .await;
    assert_eq!(
      opened,
      ViewEvent::FileOpened {
        path,
        text: "class Main {}".to_string(),
      }
    );
  }

  /// Test: Project-scoped commands fail cleanly before a project is loaded.
  #[tokio::test]
  async fn test_commands_without_project_fail() {
    let mut ctx = ActorTestContext::new();

    ctx.handle.open_file("Main.java").await.expect("send");
    ctx.handle.export_mappings().await.expect("send");
    ctx.handle.decompile_minecraft("client.jar").await.expect("send");

    for operation in [
      OperationKind::OpenFile,
      OperationKind::ExportMappings,
      OperationKind::Decompile,
    ] {
      let event = ctx
        .wait_for_event(|e| matches!(e, ViewEvent::OperationFailed { .. }))
        .await;
      assert_eq!(
        event,
        ViewEvent::OperationFailed {
          operation,
          message: "No project loaded".to_string(),
        }
      );
    }
    assert!(ctx.tooling.exported().is_empty());
  }

  /// Test: Export writes the snapshot current at the time it was requested.
  #[tokio::test]
  async fn test_export_uses_current_snapshot() {
    let mut ctx = ActorTestContext::new();
    ctx.load_project().await;

    ctx.handle.rename("Main.java", "func_1_a", "tick").await.expect("send");
    ctx.handle.export_mappings().await.expect("send");

    let exported = ctx
      .wait_for_event(|e| matches!(e, ViewEvent::Exported { .. }))
      .await;
    assert_eq!(
      exported,
      ViewEvent::Exported {
        path: ctx.project_path().join("mappings.csv"),
      }
    );
    assert_eq!(
      ctx.tooling.exported(),
      vec![MappingSnapshot::from_pairs([("func_1_a", "tick")])]
    );
  }

  // ==========================================================================
  // Failure Isolation
  // ==========================================================================

  /// Test: A failed operation is reported and the actor keeps serving.
  #[tokio::test]
  async fn test_failed_operation_keeps_actor_alive() {
    let mut ctx = ActorTestContext::new();
    let missing = ctx.project_path().join("missing.zip");

    ctx.handle.set_initial_mappings(&missing).await.expect("send");
    let failed = ctx
      .wait_for_event(|e| matches!(e, ViewEvent::OperationFailed { .. }))
      .await;
    let ViewEvent::OperationFailed { operation, message } = failed else {
      unreachable!()
    };
    assert_eq!(operation, OperationKind::SetInitialMappings);
    assert!(message.contains("missing.zip"), "message: {message}");

    ctx.handle.rename("Main.java", "a", "alpha").await.expect("send");
    let snapshot = ctx.handle.retrieve_mappings().await.expect("retrieve");
    assert_eq!(snapshot, MappingSnapshot::from_pairs([("a", "alpha")]));
  }

  /// Test: A panicking operation is contained and reported.
  #[tokio::test]
  async fn test_panicking_operation_is_reported() {
    let mut ctx = ActorTestContext::new();

    ctx.handle.set_initial_mappings("panic.zip").await.expect("send");
    let failed = ctx
      .wait_for_event(|e| matches!(e, ViewEvent::OperationFailed { .. }))
      .await;
    assert_eq!(
      failed,
      ViewEvent::OperationFailed {
        operation: OperationKind::SetInitialMappings,
        message: "Operation panicked".to_string(),
      }
    );

    // Barrier was released
    let snapshot = ctx.handle.retrieve_mappings().await.expect("retrieve");
    assert!(snapshot.is_empty());
  }

  /// Test: A malformed rename that reaches the actor is dropped and reported.
  #[tokio::test]
  async fn test_malformed_rename_reports_internal_error() {
    let mut ctx = ActorTestContext::new();

    ctx.handle.rename("Main.java", "field_1_a", "1abc").await.expect("send");
    ctx.handle.rename("Main.java", "", "valid").await.expect("send");

    for _ in 0..2 {
      let event = ctx
        .wait_for_event(|e| matches!(e, ViewEvent::InternalError { .. }))
        .await;
      assert!(matches!(event, ViewEvent::InternalError { .. }));
    }

    let snapshot = ctx.handle.retrieve_mappings().await.expect("retrieve");
    assert!(snapshot.is_empty());
  }

  // ==========================================================================
  // Single-Lane Operations
  // ==========================================================================

  /// Test: A second export waits for the first instead of running alongside it.
  #[tokio::test]
  async fn test_exports_run_one_at_a_time() {
    let mut ctx = ActorTestContext::new();
    ctx.load_project().await;
    ctx.tooling.hold(OperationKind::ExportMappings);

    ctx.handle.export_mappings().await.expect("send");
    ctx.handle.rename("Main.java", "a", "alpha").await.expect("send");
    ctx.handle.export_mappings().await.expect("send");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ctx.tooling.exported().is_empty());
    ctx.tooling.release(OperationKind::ExportMappings);

    for _ in 0..2 {
      ctx
        .wait_for_event(|e| matches!(e, ViewEvent::Exported { .. }))
        .await;
    }
    assert_eq!(ctx.tooling.max_active(), 1);
    assert_eq!(
      ctx.tooling.exported(),
      vec![MappingSnapshot::empty(), MappingSnapshot::from_pairs([("a", "alpha")])]
    );
  }

  /// Test: Loading another project waits for a running decompile, so its
  /// result lands on the project it was started for.
  #[tokio::test]
  async fn test_load_project_waits_for_running_lane() {
    let mut ctx = ActorTestContext::new();
    ctx.load_project().await;
    let other = tempfile::TempDir::new().expect("create second project");
    ctx.tooling.hold(OperationKind::Decompile);

    ctx.handle.decompile_minecraft("client.jar").await.expect("send");
    ctx.handle.load_project(other.path()).await.expect("send");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
      !ctx
        .drain_events()
        .iter()
        .any(|e| matches!(e, ViewEvent::ProjectLoaded { .. }))
    );
    ctx.tooling.release(OperationKind::Decompile);

    let decompiled = ctx
      .wait_for_event(|e| matches!(e, ViewEvent::Decompiled { .. } | ViewEvent::ProjectLoaded { .. }))
      .await;
    assert_eq!(
      decompiled,
      ViewEvent::Decompiled {
        output: ctx.project_path().join("decompiled"),
      }
    );
    let loaded = ctx
      .wait_for_event(|e| matches!(e, ViewEvent::ProjectLoaded { .. }))
      .await;
    assert_eq!(
      loaded,
      ViewEvent::ProjectLoaded {
        directory: other.path().to_path_buf(),
        decompiled: None,
      }
    );
  }

  /// Test: A completion slot gets its own command's result, not a neighbour's.
  #[tokio::test]
  async fn test_completion_receives_own_result() {
    let ctx = ActorTestContext::new();
    ctx.tooling.add_archive("good.zip", MappingSnapshot::from_pairs([("a", "alpha")]));

    ctx.handle.set_initial_mappings("missing.zip").await.expect("send");
    let good = ctx
      .handle
      .request(|done| Command::SetInitialMappings {
        archive: "good.zip".into(),
        done,
      })
      .await
      .expect("actor alive");
    assert_eq!(
      good,
      Ok(ViewEvent::MappingsChanged(MappingSnapshot::from_pairs([("a", "alpha")])))
    );

    let failed = ctx
      .handle
      .request(|done| Command::ExportMappings { done })
      .await
      .expect("actor alive");
    assert_eq!(failed, Err("No project loaded".to_string()));
  }

  // ==========================================================================
  // Cancellation and Shutdown
  // ==========================================================================

  /// Test: A cancelled query returns promptly even though the actor is busy.
  #[tokio::test]
  async fn test_cancelled_retrieve_returns_cancelled() {
    let ctx = ActorTestContext::new();
    ctx.tooling.add_archive("mcp.zip", MappingSnapshot::empty());
    ctx.tooling.hold(OperationKind::SetInitialMappings);
    ctx.handle.set_initial_mappings("mcp.zip").await.expect("send");

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(50)).await;
      canceller.cancel();
    });

    let result = tokio::time::timeout(EVENT_TIMEOUT, ctx.handle.retrieve_mappings_until(&token))
      .await
      .expect("cancelled query should return");
    assert_eq!(result, Err(SendError::Cancelled));

    // The abandoned reply slot does not disturb later queries
    ctx.tooling.release(OperationKind::SetInitialMappings);
    assert!(ctx.handle.retrieve_mappings().await.is_ok());
  }

  /// Test: Cancelling the actor closes the queue.
  #[tokio::test]
  async fn test_cancel_stops_actor() {
    let ctx = ActorTestContext::new();
    ctx.cancel.cancel();

    assert!(wait_for(EVENT_TIMEOUT, || ctx.handle.is_closed()).await);
    assert_eq!(ctx.handle.retrieve_mappings().await, Err(SendError::ActorGone));
  }

  /// Test: Dropping every handle lets in-flight work finish, then stops the actor.
  #[tokio::test]
  async fn test_actor_drains_after_handles_drop() {
    let tooling = Arc::new(FakeTooling::default());
    tooling.add_archive("mcp.zip", MappingSnapshot::from_pairs([("a", "alpha")]));
    let (view_tx, mut events) = mpsc::channel(64);
    let handle = ProjectActor::spawn(&ActorConfig::default(), tooling, view_tx, CancellationToken::new());

    handle.set_initial_mappings("mcp.zip").await.expect("send");
    drop(handle);

    let mut saw_mappings = false;
    while let Some(event) = tokio::time::timeout(EVENT_TIMEOUT, events.recv())
      .await
      .expect("actor should stop")
    {
      saw_mappings |= matches!(event, ViewEvent::MappingsChanged(_));
    }
    assert!(saw_mappings);
  }
}
