//! Command ordering tests.
//!
//! Commands from one producer are applied in send order, and queries observe
//! every command enqueued before them, including slow barrier operations.

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use pretty_assertions::assert_eq;

  use crate::{
    actor::{
      __tests__::helpers::ActorTestContext,
      message::{OperationKind, ViewEvent},
    },
    domain::mapping::MappingSnapshot,
  };

  /// Test: Several producers rename concurrently; each producer's renames land in order.
  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_per_producer_order_is_preserved() {
    const PRODUCERS: usize = 4;
    const RENAMES: usize = 25;

    let mut ctx = ActorTestContext::new();

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
      let handle = ctx.handle.clone();
      producers.push(tokio::spawn(async move {
        for i in 0..RENAMES {
          handle
            .rename("Main.java", format!("field_{p}_a"), format!("value{i}"))
            .await
            .expect("send rename");
        }
      }));
    }
    for producer in producers {
      producer.await.expect("producer task");
    }

    // Enqueued after every rename, so it sees all of them
    let snapshot = ctx.handle.retrieve_mappings().await.expect("retrieve");
    assert_eq!(snapshot.len(), PRODUCERS);
    for p in 0..PRODUCERS {
      let expected = format!("value{}", RENAMES - 1);
      assert_eq!(snapshot.mapped_name(&format!("field_{p}_a")), Some(expected.as_str()));
    }

    // The status trail shows each producer's renames in send order
    let mut seen = vec![Vec::new(); PRODUCERS];
    for event in ctx.drain_events() {
      let ViewEvent::Status(status) = event else { continue };
      if status.category != "Rename" {
        continue;
      }
      let (old, new) = status.message.split_once(" -> ").expect("rename status format");
      let producer: usize = old
        .trim_start_matches("field_")
        .trim_end_matches("_a")
        .parse()
        .expect("producer index");
      let index: usize = new.trim_start_matches("value").parse().expect("rename index");
      seen[producer].push(index);
    }
    for (producer, indices) in seen.iter().enumerate() {
      assert_eq!(indices, &(0..RENAMES).collect::<Vec<_>>(), "producer {producer}");
    }
  }

  /// Test: Two concurrent queries after SetInitialMappings both see the new snapshot.
  #[tokio::test]
  async fn test_queries_observe_initial_mappings() {
    let ctx = ActorTestContext::new();
    let archive = ctx.project_path().join("mcp.zip");
    let expected = MappingSnapshot::from_pairs([("a", "alpha"), ("b", "beta")]);
    ctx.tooling.add_archive(&archive, expected.clone());

    ctx.handle.set_initial_mappings(&archive).await.expect("send");

    let (first, second) = tokio::join!(ctx.handle.retrieve_mappings(), ctx.handle.retrieve_mappings());
    assert_eq!(first.expect("first retrieve"), expected);
    assert_eq!(second.expect("second retrieve"), expected);
  }

  /// Test: A query waits behind a slow barrier operation instead of overtaking it.
  #[tokio::test]
  async fn test_barrier_defers_later_commands() {
    let ctx = ActorTestContext::new();
    let archive = ctx.project_path().join("mcp.zip");
    let expected = MappingSnapshot::from_pairs([("func_1_a", "tick")]);
    ctx.tooling.add_archive(&archive, expected.clone());
    ctx.tooling.hold(OperationKind::SetInitialMappings);

    ctx.handle.set_initial_mappings(&archive).await.expect("send");

    let handle = ctx.handle.clone();
    let mut query = tokio::spawn(async move { handle.retrieve_mappings().await });

    let pending = tokio::time::timeout(Duration::from_millis(100), &mut query).await;
    assert!(pending.is_err(), "query must not complete before the barrier");

    ctx.tooling.release(OperationKind::SetInitialMappings);
    let snapshot = query.await.expect("query task").expect("retrieve");
    assert_eq!(snapshot, expected);
  }

  /// Test: Renames queued behind SetInitialMappings apply on top of it.
  #[tokio::test]
  async fn test_rename_applies_after_initial_mappings() {
    let ctx = ActorTestContext::new();
    let archive = ctx.project_path().join("mcp.zip");
    ctx
      .tooling
      .add_archive(&archive, MappingSnapshot::from_pairs([("a", "alpha"), ("b", "beta")]));
    ctx.tooling.hold(OperationKind::SetInitialMappings);

    ctx.handle.set_initial_mappings(&archive).await.expect("send");
    ctx.handle.rename("Main.java", "b", "bravo").await.expect("send");
    ctx.handle.rename("Main.java", "c", "charlie").await.expect("send");
    ctx.tooling.release(OperationKind::SetInitialMappings);

    let snapshot = ctx.handle.retrieve_mappings().await.expect("retrieve");
    assert_eq!(
      snapshot,
      MappingSnapshot::from_pairs([("a", "alpha"), ("b", "bravo"), ("c", "charlie")])
    );
  }

  /// Test: Published snapshots are immutable; later renames do not leak into them.
  #[tokio::test]
  async fn test_snapshots_are_stable() {
    let ctx = ActorTestContext::new();

    ctx.handle.rename("Main.java", "a", "alpha").await.expect("send");
    let before = ctx.handle.retrieve_mappings().await.expect("retrieve");
    ctx.handle.rename("Main.java", "a", "aleph").await.expect("send");
    let after = ctx.handle.retrieve_mappings().await.expect("retrieve");

    assert_eq!(before.mapped_name("a"), Some("alpha"));
    assert_eq!(after.mapped_name("a"), Some("aleph"));
  }
}
