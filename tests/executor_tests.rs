use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;

use kubectl_a2a::{
    A2aError, CreatePlanFunction, FunctionParams, PriorityTaskExecutor, TaskHandle, TaskPriority,
};

/// Occupy the worker with a task that runs until the returned sender fires.
async fn hold_worker(executor: &PriorityTaskExecutor) -> (oneshot::Sender<()>, TaskHandle<()>) {
    let (release, gate) = oneshot::channel::<()>();
    let (started_tx, started_rx) = oneshot::channel::<()>();
    let handle = executor.enqueue(
        move || async move {
            let _ = started_tx.send(());
            let _ = gate.await;
            Ok(())
        },
        TaskPriority::Low,
    );
    started_rx.await.unwrap();
    (release, handle)
}

type Log = Arc<Mutex<Vec<&'static str>>>;

fn recorder(
    log: Log,
    name: &'static str,
) -> impl FnOnce() -> std::future::Ready<kubectl_a2a::Result<&'static str>> + Send + 'static {
    move || {
        log.lock().push(name);
        std::future::ready(Ok(name))
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn test_concurrent_submits_run_by_priority() {
    let executor = PriorityTaskExecutor::new();
    let log: Log = Arc::default();

    let (low, high, medium) = tokio::join!(
        executor.submit(recorder(log.clone(), "low"), TaskPriority::Low),
        executor.submit(recorder(log.clone(), "high"), TaskPriority::High),
        executor.submit(recorder(log.clone(), "medium"), TaskPriority::Medium),
    );

    assert_eq!(high.unwrap(), "high");
    assert_eq!(medium.unwrap(), "medium");
    assert_eq!(low.unwrap(), "low");
    assert_eq!(*log.lock(), ["high", "medium", "low"]);
}

#[tokio::test]
async fn test_queued_work_orders_by_priority_then_submission() {
    let executor = PriorityTaskExecutor::new();
    let log: Log = Arc::default();
    let (release, running) = hold_worker(&executor).await;

    let handles = vec![
        executor.enqueue(recorder(log.clone(), "low-1"), TaskPriority::Low),
        executor.enqueue(recorder(log.clone(), "medium-1"), TaskPriority::Medium),
        executor.enqueue(recorder(log.clone(), "high-1"), TaskPriority::High),
        executor.enqueue(recorder(log.clone(), "low-2"), TaskPriority::Low),
        executor.enqueue(recorder(log.clone(), "high-2"), TaskPriority::High),
        executor.enqueue(recorder(log.clone(), "medium-2"), TaskPriority::Medium),
    ];
    assert_eq!(executor.pending(), 6);
    assert!(log.lock().is_empty());

    release.send(()).unwrap();
    running.await.unwrap();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        *log.lock(),
        ["high-1", "high-2", "medium-1", "medium-2", "low-1", "low-2"]
    );
}

#[tokio::test]
async fn test_factory_invoked_only_when_scheduled() {
    let executor = PriorityTaskExecutor::new();
    let invoked = Arc::new(AtomicBool::new(false));
    let (release, running) = hold_worker(&executor).await;

    let flag = Arc::clone(&invoked);
    let handle = executor.enqueue(
        move || {
            flag.store(true, Ordering::SeqCst);
            async { Ok(()) }
        },
        TaskPriority::High,
    );
    tokio::task::yield_now().await;
    assert!(!invoked.load(Ordering::SeqCst));

    release.send(()).unwrap();
    running.await.unwrap();
    handle.await.unwrap();
    assert!(invoked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failure_reaches_only_its_caller() {
    let executor = PriorityTaskExecutor::new();

    let failed = executor
        .submit(
            || async { Err::<(), _>(A2aError::TaskFailed("boom".into())) },
            TaskPriority::High,
        )
        .await;
    let ok = executor
        .submit(|| async { Ok::<_, A2aError>(7) }, TaskPriority::High)
        .await;

    assert!(matches!(failed, Err(A2aError::TaskFailed(msg)) if msg == "boom"));
    assert_eq!(ok.unwrap(), 7);
}

#[tokio::test]
async fn test_panic_is_isolated() {
    let executor = PriorityTaskExecutor::new();

    let panicked = executor.enqueue(
        || async {
            if true {
                panic!("kaboom");
            }
            Ok::<(), A2aError>(())
        },
        TaskPriority::High,
    );
    let after = executor.enqueue(|| async { Ok::<_, A2aError>("still running") }, TaskPriority::Low);

    let err = panicked.await.unwrap_err();
    assert!(matches!(&err, A2aError::TaskPanicked(msg) if msg.contains("kaboom")));
    assert_eq!(after.await.unwrap(), "still running");
}

#[tokio::test]
async fn test_dropped_handle_is_skipped() {
    let executor = PriorityTaskExecutor::new();
    let ran = Arc::new(AtomicBool::new(false));
    let (release, running) = hold_worker(&executor).await;

    let flag = Arc::clone(&ran);
    let abandoned = executor.enqueue(
        move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        },
        TaskPriority::High,
    );
    let kept = executor.enqueue(|| async { Ok::<_, A2aError>(1) }, TaskPriority::Low);
    drop(abandoned);
    assert_eq!(executor.pending(), 1);

    release.send(()).unwrap();
    running.await.unwrap();
    assert_eq!(kept.await.unwrap(), 1);
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_cancelled_handle_resolves_as_cancelled() {
    let executor = PriorityTaskExecutor::new();
    let (release, running) = hold_worker(&executor).await;

    let handle = executor.enqueue(|| async { Ok::<_, A2aError>(()) }, TaskPriority::High);
    handle.cancel();
    assert!(handle.is_cancelled());

    release.send(()).unwrap();
    running.await.unwrap();
    let err = handle.await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_aborted_submit_does_not_block_queue() {
    let executor = PriorityTaskExecutor::new();
    let (release, running) = hold_worker(&executor).await;

    let caller = {
        let executor = executor.clone();
        tokio::spawn(async move {
            executor
                .submit(|| async { Ok::<_, A2aError>(()) }, TaskPriority::High)
                .await
        })
    };
    wait_until(|| executor.pending() == 1).await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());
    assert_eq!(executor.pending(), 0);

    let next = executor.enqueue(|| async { Ok::<_, A2aError>("next") }, TaskPriority::Low);
    release.send(()).unwrap();
    running.await.unwrap();
    assert_eq!(next.await.unwrap(), "next");
}

#[tokio::test]
async fn test_shutdown_cancels_pending_and_lets_running_finish() {
    let executor = PriorityTaskExecutor::new();
    let (release, running) = hold_worker(&executor).await;

    let pending: Vec<_> = (0..3)
        .map(|i| executor.enqueue(move || async move { Ok::<_, A2aError>(i) }, TaskPriority::High))
        .collect();

    let stopper = {
        let executor = executor.clone();
        tokio::spawn(async move { executor.shutdown().await })
    };
    wait_until(|| executor.pending() == 0).await;
    assert!(executor.is_worker_running());

    release.send(()).unwrap();
    stopper.await.unwrap();

    running.await.unwrap();
    for handle in pending {
        assert!(matches!(handle.await, Err(A2aError::TaskCancelled)));
    }
    assert!(!executor.is_worker_running());
}

#[tokio::test]
async fn test_abandoned_shutdown_leaves_executor_usable() {
    let executor = PriorityTaskExecutor::new();
    let (release, running) = hold_worker(&executor).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(20), executor.shutdown()).await;
    assert!(abandoned.is_err());

    release.send(()).unwrap();
    running.await.unwrap();

    let value = tokio::time::timeout(
        Duration::from_secs(2),
        executor.submit(|| async { Ok::<_, A2aError>("after") }, TaskPriority::High),
    )
    .await
    .expect("submit after timed-out shutdown should complete")
    .unwrap();
    assert_eq!(value, "after");
    wait_until(|| !executor.is_worker_running()).await;
}

#[tokio::test]
async fn test_concurrent_shutdowns_wait_for_worker_exit() {
    let executor = PriorityTaskExecutor::new();
    let (release, running) = hold_worker(&executor).await;

    let stoppers: Vec<_> = (0..2)
        .map(|_| {
            let executor = executor.clone();
            tokio::spawn(async move {
                executor.shutdown().await;
                executor.is_worker_running()
            })
        })
        .collect();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(stoppers.iter().all(|stopper| !stopper.is_finished()));
    assert!(executor.is_worker_running());

    release.send(()).unwrap();
    running.await.unwrap();
    for stopper in stoppers {
        assert!(!stopper.await.unwrap());
    }
    assert!(!executor.is_worker_running());
}

#[tokio::test]
async fn test_executor_usable_after_shutdown() {
    let executor = PriorityTaskExecutor::new();
    executor.shutdown().await;

    let value = executor
        .submit(|| async { Ok::<_, A2aError>("again") }, TaskPriority::Medium)
        .await
        .unwrap();
    assert_eq!(value, "again");
}

#[tokio::test]
async fn test_worker_exits_when_idle() {
    let executor = PriorityTaskExecutor::new();
    assert!(!executor.is_worker_running());

    executor
        .submit(|| async { Ok::<_, A2aError>(()) }, TaskPriority::Medium)
        .await
        .unwrap();
    wait_until(|| !executor.is_worker_running()).await;

    executor
        .submit(|| async { Ok::<_, A2aError>(()) }, TaskPriority::Medium)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_run_function_validates_inside_task() {
    let executor = PriorityTaskExecutor::new();
    let function = Arc::new(CreatePlanFunction);

    let missing = executor
        .run_function(function.clone(), FunctionParams::new(), TaskPriority::High)
        .await;
    assert!(matches!(missing, Err(A2aError::InvalidParameters(_))));

    let mut params = FunctionParams::new();
    params.insert(
        "steps".into(),
        json!([{"function_name": "deploy_to", "arguments": {"cluster": "edge"}}]),
    );
    let result = executor
        .run_function(function, params, TaskPriority::High)
        .await
        .unwrap();
    assert_eq!(result["status"], "plan created");
    assert_eq!(result["steps"][0]["function_name"], "deploy_to");
}
