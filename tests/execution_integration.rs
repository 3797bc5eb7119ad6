//! Command execution integration tests.
//!
//! These run real commands through /bin/sh and are unix-only.

#![cfg(unix)]

use std::time::{Duration, Instant};

use shell_exec::execution::{
    CommandExecutor, ExecutionRequest, ExecutionStatus, ExecutorConfig, OutputMode, SpawnFailure,
    TRUNCATION_MARKER,
};

fn executor() -> CommandExecutor {
    CommandExecutor::new(ExecutorConfig {
        enable_logging: false,
        ..ExecutorConfig::default()
    })
}

fn executor_with(f: impl FnOnce(&mut ExecutorConfig)) -> CommandExecutor {
    let mut config = ExecutorConfig {
        enable_logging: false,
        ..ExecutorConfig::default()
    };
    f(&mut config);
    CommandExecutor::new(config)
}

// ============================================================================
// Completion
// ============================================================================

#[tokio::test]
async fn test_echo_hello() {
    let result = executor().execute(&ExecutionRequest::new("echo hello")).await;

    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout, b"hello\n");
    assert!(result.stderr.is_empty());
    assert!(!result.timed_out);
    assert!(result.success());
}

#[tokio::test]
async fn test_false_is_not_an_error() {
    let result = executor().execute(&ExecutionRequest::new("false")).await;

    assert_eq!(result.exit_code, Some(1));
    assert_eq!(result.status, ExecutionStatus::Exited(1));
    assert!(result.error().is_none());
}

#[tokio::test]
async fn test_pipes_and_redirection() {
    let result = executor()
        .execute(&ExecutionRequest::new(
            "printf 'b\\na\\nc\\n' | sort | head -n 2; echo oops >&2; exit 3",
        ))
        .await;

    assert_eq!(result.exit_code, Some(3));
    assert_eq!(result.stdout_text(), "a\nb\n");
    assert_eq!(result.stderr_text(), "oops\n");
}

#[tokio::test]
async fn test_env_and_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = std::fs::canonicalize(dir.path()).unwrap();

    let request = ExecutionRequest::new("echo \"$GREETING\"; pwd -P")
        .env("GREETING", "hi there")
        .working_dir(dir.path());
    let result = executor().execute(&request).await;

    assert!(result.success());
    assert_eq!(
        result.stdout_text(),
        format!("hi there\n{}\n", canonical.display())
    );
}

#[tokio::test]
async fn test_stdin_is_closed() {
    let result = executor()
        .execute(&ExecutionRequest::new("cat; echo done").timeout_secs(5))
        .await;

    assert!(!result.timed_out);
    assert_eq!(result.stdout_text(), "done\n");
}

#[tokio::test]
async fn test_binary_output_is_kept() {
    let result = executor()
        .execute(&ExecutionRequest::new("printf '\\377\\000\\001'"))
        .await;

    assert_eq!(result.stdout, vec![0xff, 0x00, 0x01]);
}

// ============================================================================
// Spawn failures
// ============================================================================

#[tokio::test]
async fn test_nonexistent_binary() {
    let result = executor()
        .execute(&ExecutionRequest::new("nonexistent_binary_xyz_123"))
        .await;

    assert_eq!(
        result.status,
        ExecutionStatus::SpawnFailed(SpawnFailure::CommandNotFound)
    );
    assert_eq!(result.exit_code, None);
    assert!(!result.timed_out);
    assert!(!result.stderr.is_empty());
}

#[tokio::test]
async fn test_exit_codes_127_and_126_from_the_command_itself() {
    let result = executor().execute(&ExecutionRequest::new("exit 127")).await;
    assert_eq!(result.exit_code, Some(127));
    assert_eq!(result.status, ExecutionStatus::Exited(127));

    let result = executor()
        .execute(&ExecutionRequest::new("echo ran; exit 126"))
        .await;
    assert_eq!(result.exit_code, Some(126));
    assert_eq!(result.status, ExecutionStatus::Exited(126));
    assert_eq!(result.stdout_text(), "ran\n");
}

#[tokio::test]
async fn test_not_found_detected_in_combined_mode() {
    let executor = executor_with(|c| c.output_mode = OutputMode::Combined);
    let result = executor
        .execute(&ExecutionRequest::new("nonexistent_binary_xyz_456"))
        .await;

    assert_eq!(
        result.status,
        ExecutionStatus::SpawnFailed(SpawnFailure::CommandNotFound)
    );
}

#[tokio::test]
async fn test_unavailable_shell() {
    let executor = executor_with(|c| c.shell = "/nonexistent/shell".into());
    let result = executor.execute(&ExecutionRequest::new("echo hi")).await;

    assert_eq!(
        result.status,
        ExecutionStatus::SpawnFailed(SpawnFailure::ShellUnavailable)
    );
    assert!(result.stdout.is_empty());
}

// ============================================================================
// Timeouts and cancellation
// ============================================================================

#[tokio::test]
async fn test_sleep_times_out() {
    let start = Instant::now();
    let result = executor()
        .execute(&ExecutionRequest::new("sleep 10").timeout(Duration::from_secs(1)))
        .await;
    let elapsed = start.elapsed();

    assert!(result.timed_out);
    assert_eq!(result.exit_code, None);
    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert_eq!(result.time_limit, Some(Duration::from_secs(1)));
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_partial_output_survives_timeout() {
    let result = executor()
        .execute(&ExecutionRequest::new("echo started; sleep 10").timeout_secs(1))
        .await;

    assert!(result.timed_out);
    assert_eq!(result.stdout_text(), "started\n");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_background_grandchild_killed_on_timeout() {
    let result = executor()
        .execute(&ExecutionRequest::new("sleep 30 & echo $!; wait").timeout_secs(1))
        .await;
    assert!(result.timed_out);

    let pid: u32 = result.stdout_text().trim().parse().unwrap();
    let stat = format!("/proc/{}/stat", pid);

    // Gone, or a zombie waiting to be reaped by init.
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        match std::fs::read_to_string(&stat) {
            Err(_) => break,
            Ok(content) if content.contains(") Z ") => break,
            Ok(_) if Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await
            }
            Ok(content) => panic!("grandchild still running: {}", content),
        }
    }
}

#[tokio::test]
async fn test_cancel_before_timeout() {
    let start = Instant::now();
    let cancel = tokio::time::sleep(Duration::from_millis(200));
    let result = executor()
        .execute_with_cancel(&ExecutionRequest::new("sleep 10").timeout_secs(5), cancel)
        .await;

    assert_eq!(result.status, ExecutionStatus::Cancelled);
    assert!(!result.timed_out);
    assert_eq!(result.exit_code, None);
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_default_timeout_from_config() {
    let executor = executor_with(|c| c.default_timeout = Duration::from_secs(1));
    let result = executor.execute(&ExecutionRequest::new("sleep 10")).await;

    assert!(result.timed_out);
}

// ============================================================================
// Output capture
// ============================================================================

#[tokio::test]
async fn test_truncation_exact_cap() {
    let executor = executor_with(|c| c.max_output_bytes = 100);
    let result = executor
        .execute(&ExecutionRequest::new("head -c 5000 /dev/zero | tr '\\0' a"))
        .await;

    assert!(result.success());
    assert!(result.stdout_truncated);
    assert!(!result.stderr_truncated);

    let mut expected = vec![b'a'; 100];
    expected.extend_from_slice(TRUNCATION_MARKER.as_bytes());
    assert_eq!(result.stdout, expected);
}

#[tokio::test]
async fn test_output_at_cap_not_truncated() {
    let executor = executor_with(|c| c.max_output_bytes = 100);
    let result = executor
        .execute(&ExecutionRequest::new("head -c 100 /dev/zero | tr '\\0' a"))
        .await;

    assert!(!result.stdout_truncated);
    assert_eq!(result.stdout.len(), 100);
}

#[tokio::test]
async fn test_large_output_does_not_deadlock() {
    let executor = executor_with(|c| c.max_output_bytes = 1024);
    let result = executor
        .execute(
            &ExecutionRequest::new("head -c 2000000 /dev/zero; head -c 2000000 /dev/zero >&2")
                .timeout_secs(10),
        )
        .await;

    assert!(!result.timed_out);
    assert!(result.success());
    assert!(result.stdout_truncated);
    assert!(result.stderr_truncated);
}

#[tokio::test]
async fn test_combined_mode() {
    let executor = executor_with(|c| c.output_mode = OutputMode::Combined);
    let result = executor
        .execute(&ExecutionRequest::new("echo out; sleep 0.1; echo err >&2"))
        .await;

    assert_eq!(result.stdout_text(), "out\nerr\n");
    assert!(result.stderr.is_empty());
}

#[tokio::test]
async fn test_straggler_does_not_hold_result() {
    let start = Instant::now();
    let result = executor()
        .execute(&ExecutionRequest::new("sleep 5 & echo parent done").timeout_secs(10))
        .await;

    assert!(result.success());
    assert_eq!(result.stdout_text(), "parent done\n");
    assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_executions_are_independent() {
    let executor = executor();
    let start = Instant::now();

    let runs = (0..8).map(|i| {
        let executor = executor.clone();
        tokio::spawn(async move {
            let request = ExecutionRequest::new(format!("sleep 0.5; echo {}", i));
            (i, executor.execute(&request).await)
        })
    });

    for handle in futures_util::future::join_all(runs).await {
        let (i, result) = handle.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout_text(), format!("{}\n", i));
    }
    assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
}

#[tokio::test]
async fn test_timeout_does_not_affect_sibling() {
    let executor = executor();
    let slow = ExecutionRequest::new("sleep 10").timeout_secs(1);
    let quick = ExecutionRequest::new("sleep 1.5; echo fine").timeout_secs(5);

    let (slow, quick) = tokio::join!(executor.execute(&slow), executor.execute(&quick));

    assert!(slow.timed_out);
    assert!(quick.success());
    assert_eq!(quick.stdout_text(), "fine\n");
}
