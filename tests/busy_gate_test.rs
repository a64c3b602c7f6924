//! Busy flag timing through the public API

mod common;

use common::{Hooks, LinearFlow, question};
use std::time::Duration;
use stepwise::{EngineConfig, LoadingGate, provider_fn};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_gate_bounds() {
    let gate = LoadingGate::new(Duration::from_millis(500));

    for op_ms in [0u64, 120, 499, 500, 900] {
        let start = Instant::now();
        gate.run(tokio::time::sleep(Duration::from_millis(op_ms))).await;
        let elapsed = start.elapsed();

        let upper = Duration::from_millis(op_ms.max(500));
        assert!(elapsed >= Duration::from_millis(500), "{op_ms}ms op: {elapsed:?}");
        assert!(elapsed < upper + Duration::from_millis(5), "{op_ms}ms op: {elapsed:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_engine_respects_configured_minimum() {
    let q1 = question("q1", &[("a", "A")]);
    let q2 = question("q2", &[("b", "B")]);
    let engine = Hooks::default().build(
        q1.clone(),
        LinearFlow::new(vec![q1, q2]),
        EngineConfig::default().with_min_busy_duration(Duration::from_millis(200)),
    );
    let mut busy = engine.subscribe_busy();

    let start = Instant::now();
    let task = tokio::spawn({
        let engine = engine.clone();
        async move { engine.select_value("a").await }
    });

    busy.changed().await.unwrap();
    assert!(*busy.borrow_and_update());

    task.await.unwrap().unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(205));
    assert!(!engine.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_is_not_padded() {
    let q1 = question("q1", &[("a", "A")]);
    let engine = Hooks::default().build(
        q1,
        provider_fn(|_| async {
            tokio::time::sleep(Duration::from_millis(800)).await;
            Ok(stepwise::Outcome::Terminal)
        }),
        EngineConfig::default(),
    );

    let start = Instant::now();
    engine.select_value("a").await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(800));
    assert!(elapsed < Duration::from_millis(805));
}
