//! Sync loop controller.
//!
//! The background cycle runs
//! `FETCHING → COMPARING → INSTALLING → [RELOADING] → SLEEPING → FETCHING …`
//! until [`SyncController::stop`] is called. Failures inside an iteration
//! are logged and the cycle sleeps and tries again; they never end it.
//!
//! [`SyncController::update`] runs the same pass on demand and returns
//! errors to its caller. Passes are serialised by one async mutex, and the
//! store serialises its own read-modify-writes underneath that.
//!
//! Every spawned cycle owns its cancel flag. A cycle that was cancelled
//! mid-install keeps its flag after a restart, so it winds down while the
//! new cycle waits on the pass lock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use reqloader_core::{InstallOutcome, ManifestChange, SyncConfig};
use reqloader_sync::{SyncError, Syncer};

use crate::error::{join_err, DaemonError};
use crate::reloader::{ExecReloader, Reloader};

/// Result of one pass through the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub change: ManifestChange,
    pub install: InstallOutcome,
    /// Only ever `true` with a test reloader; a real reload does not return.
    pub reloaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fetching,
    Comparing,
    Installing,
    Reloading,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Stage::Fetching => "fetching",
            Stage::Comparing => "comparing",
            Stage::Installing => "installing",
            Stage::Reloading => "reloading",
        }
    }
}

/// Owned by the background task only.
#[derive(Debug, Default)]
struct LoopState {
    iterations: u64,
    consecutive_failures: u32,
    last_error: Option<String>,
}

struct Inner {
    config: SyncConfig,
    syncer: Syncer,
    reloader: Box<dyn Reloader>,
    pass_lock: tokio::sync::Mutex<()>,
}

/// `None` for on-demand passes, which are never cancelled.
type CancelFlag<'a> = Option<&'a watch::Receiver<bool>>;

fn checkpoint(stage: Stage, cancel: CancelFlag<'_>) -> Result<(), DaemonError> {
    if cancel.is_some_and(|rx| *rx.borrow()) {
        tracing::debug!(stage = stage.label(), "cancellation observed");
        return Err(DaemonError::Cancelled);
    }
    tracing::trace!(stage = stage.label(), "entering stage");
    Ok(())
}

struct LoopHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    fn is_live(&self) -> bool {
        !self.task.is_finished()
    }

    fn is_stopping(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

/// Keeps the local manifest in step with its source and reinstalls on
/// change.
pub struct SyncController {
    inner: Arc<Inner>,
    task: Mutex<Option<LoopHandle>>,
}

impl SyncController {
    /// Controller that reloads by replacing the process image.
    pub fn new(config: SyncConfig) -> Result<Self, DaemonError> {
        Self::with_reloader(config, ExecReloader)
    }

    pub fn with_reloader(
        config: SyncConfig,
        reloader: impl Reloader + 'static,
    ) -> Result<Self, DaemonError> {
        config.validate()?;
        let inner = Inner {
            syncer: Syncer::from_config(&config),
            config,
            reloader: Box::new(reloader),
            pass_lock: tokio::sync::Mutex::new(()),
        };
        Ok(Self {
            inner: Arc::new(inner),
            task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Spawn the background cycle on the current tokio runtime.
    ///
    /// Returns `false` without spawning when a cycle is already running.
    /// A cycle that has been cancelled but is still finishing its stage does
    /// not count; it is left to exit and a fresh cycle replaces it.
    pub fn start(&self) -> Result<bool, DaemonError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DaemonError::NoRuntime)?;
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        match task.as_ref() {
            Some(current) if current.is_live() && !current.is_stopping() => {
                tracing::debug!("sync loop already running");
                return Ok(false);
            }
            Some(current) if current.is_live() => {
                tracing::debug!("previous sync loop still stopping; replacing it");
            }
            _ => {}
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let inner = self.inner.clone();
        *task = Some(LoopHandle {
            cancel_tx,
            task: runtime.spawn(run_loop(inner, cancel_rx)),
        });

        tracing::info!(
            source = %self.inner.config.source,
            interval_secs = self.inner.config.poll_interval_secs,
            silent = self.inner.config.silent,
            reload_on_change = self.inner.config.reload_on_change,
            "sync loop started",
        );
        Ok(true)
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(LoopHandle::is_live)
    }

    /// Signal the background cycle to stop without waiting for it.
    pub fn cancel(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = task.as_ref() {
            current.cancel_tx.send_replace(true);
        }
    }

    /// Cancel the background cycle and wait for it to finish its current
    /// stage. An install already in progress runs to completion.
    pub async fn stop(&self) -> Result<(), DaemonError> {
        self.cancel();
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle
                .task
                .await
                .map_err(|err| join_err("sync_loop", err))?;
        }
        Ok(())
    }

    /// Run one pass now. Errors are returned, not swallowed.
    ///
    /// With `reload`, a successful install of changed content is followed
    /// by a process reload.
    pub async fn update(&self, reload: bool) -> Result<UpdateOutcome, DaemonError> {
        run_pass(&self.inner, reload, None).await
    }

    /// Blocking form of [`update`](Self::update) for callers outside any
    /// async context. Panics if called from within a tokio runtime.
    pub fn update_blocking(&self, reload: bool) -> Result<UpdateOutcome, DaemonError> {
        let _pass = self.inner.pass_lock.blocking_lock();
        let report = self.inner.syncer.run_once()?;
        let reloaded = reload_if_needed(&self.inner, reload, report.install, None)?;
        Ok(UpdateOutcome {
            change: report.change,
            install: report.install,
            reloaded,
        })
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_loop(inner: Arc<Inner>, mut cancel_rx: watch::Receiver<bool>) {
    let interval = inner.config.poll_interval();
    let mut state = LoopState::default();

    if !inner.config.run_at_startup && sleep_or_cancel(&mut cancel_rx, interval).await {
        return;
    }

    loop {
        if *cancel_rx.borrow() {
            break;
        }
        state.iterations += 1;

        match run_pass(&inner, inner.config.reload_on_change, Some(&cancel_rx)).await {
            Ok(outcome) => {
                state.consecutive_failures = 0;
                state.last_error = None;
                if outcome.change.is_changed() || outcome.install.invoked() {
                    tracing::info!(
                        iteration = state.iterations,
                        change = %outcome.change,
                        install = %outcome.install,
                        "sync iteration completed",
                    );
                } else {
                    tracing::debug!(iteration = state.iterations, "manifest unchanged");
                }
            }
            Err(DaemonError::Cancelled) => break,
            Err(err) => {
                state.consecutive_failures += 1;
                log_iteration_error(&err, &state);
                state.last_error = Some(err.to_string());
            }
        }

        if sleep_or_cancel(&mut cancel_rx, interval).await {
            break;
        }
    }

    tracing::info!(
        iterations = state.iterations,
        last_error = state.last_error.as_deref().unwrap_or("none"),
        "sync loop stopped",
    );
}

fn log_iteration_error(err: &DaemonError, state: &LoopState) {
    match err {
        DaemonError::Sync(SyncError::SourceUnavailable { .. }) => tracing::warn!(
            iteration = state.iterations,
            consecutive_failures = state.consecutive_failures,
            error = %err,
            "manifest fetch failed; retrying next interval",
        ),
        _ => tracing::error!(
            iteration = state.iterations,
            consecutive_failures = state.consecutive_failures,
            error = %err,
            "sync iteration failed",
        ),
    }
}

/// Returns `true` when cancelled before `interval` elapsed.
async fn sleep_or_cancel(cancel_rx: &mut watch::Receiver<bool>, interval: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(interval) => false,
        _ = cancel_rx.wait_for(|cancelled| *cancelled) => true,
    }
}

async fn run_pass(
    inner: &Arc<Inner>,
    reload: bool,
    cancel: CancelFlag<'_>,
) -> Result<UpdateOutcome, DaemonError> {
    let _pass = inner.pass_lock.lock().await;

    checkpoint(Stage::Fetching, cancel)?;
    let content = blocking(inner, "fetch", |syncer| syncer.fetch()).await?;

    checkpoint(Stage::Comparing, cancel)?;
    let change = blocking(inner, "reconcile", move |syncer| syncer.reconcile(&content)).await?;

    checkpoint(Stage::Installing, cancel)?;
    let install = blocking(inner, "install", |syncer| syncer.install()).await?;

    let reloaded = reload_if_needed(inner, reload, install, cancel)?;
    Ok(UpdateOutcome {
        change,
        install,
        reloaded,
    })
}

/// Reload only after a successful install of content the process has not
/// loaded yet, including a retry of content whose first install failed.
fn reload_if_needed(
    inner: &Inner,
    reload: bool,
    install: InstallOutcome,
    cancel: CancelFlag<'_>,
) -> Result<bool, DaemonError> {
    if !(reload && install.applied_new_content()) {
        return Ok(false);
    }
    checkpoint(Stage::Reloading, cancel)?;
    tracing::info!("dependencies changed; reloading process");
    inner.reloader.reload()?;
    Ok(true)
}

async fn blocking<T, F>(inner: &Arc<Inner>, task: &'static str, f: F) -> Result<T, DaemonError>
where
    T: Send + 'static,
    F: FnOnce(&Syncer) -> Result<T, SyncError> + Send + 'static,
{
    let inner = inner.clone();
    let result = tokio::task::spawn_blocking(move || f(&inner.syncer))
        .await
        .map_err(|err| join_err(task, err))?;
    Ok(result?)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::reloader::MockReloader;
    use reqloader_core::{InstallerConfig, ManifestSource};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Instant;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().expect("tempdir"),
            }
        }

        fn source_file(&self) -> PathBuf {
            self.dir.path().join("upstream.txt")
        }

        fn log(&self) -> PathBuf {
            self.dir.path().join("calls.log")
        }

        fn publish(&self, content: &str) {
            fs::write(self.source_file(), content).expect("publish");
        }

        fn started(&self) -> PathBuf {
            self.dir.path().join("started.log")
        }

        fn failing_flag(&self) -> PathBuf {
            self.dir.path().join("fail")
        }

        fn config(&self, silent: bool, exit_code: i32) -> SyncConfig {
            self.config_with(silent, "", exit_code)
        }

        /// Installer that records its start, then takes a second to finish.
        fn slow_config(&self, silent: bool) -> SyncConfig {
            let preamble = format!("echo x >> '{}'; sleep 1; ", self.started().display());
            self.config_with(silent, &preamble, 0)
        }

        /// Installer that fails while the flag file exists.
        fn flaky_config(&self, silent: bool) -> SyncConfig {
            let flag = self.failing_flag();
            let preamble = format!("if [ -e '{}' ]; then exit 1; fi; ", flag.display());
            self.config_with(silent, &preamble, 0)
        }

        fn config_with(&self, silent: bool, preamble: &str, exit_code: i32) -> SyncConfig {
            let source =
                ManifestSource::parse(&format!("file://{}", self.source_file().display())).unwrap();
            let mut config = SyncConfig::new(source).rooted_at(&self.dir.path().join("app"));
            config.silent = silent;
            config.poll_interval_secs = 1;
            config.installer = InstallerConfig {
                program: "sh".to_string(),
                args: vec![
                    "-c".to_string(),
                    format!(
                        "{preamble}cat \"$0\" >> '{log}'; echo '--' >> '{log}'; exit {exit_code}",
                        log = self.log().display()
                    ),
                ],
            };
            config
        }

        fn installs(&self) -> usize {
            count_calls(&self.log())
        }

        fn install_starts(&self) -> usize {
            fs::read_to_string(self.started())
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }
    }

    fn count_calls(log: &Path) -> usize {
        fs::read_to_string(log)
            .map(|s| s.matches("--\n").count())
            .unwrap_or(0)
    }

    fn no_reload() -> MockReloader {
        let mut reloader = MockReloader::new();
        reloader.expect_reload().times(0);
        reloader
    }

    async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test]
    async fn update_installs_change_then_skips_identical_content() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let controller = SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap();

        let first = controller.update(false).await.unwrap();
        assert_eq!(first.change, ManifestChange::Changed);
        assert_eq!(first.install, InstallOutcome::Installed);

        let second = controller.update(false).await.unwrap();
        assert_eq!(second.change, ManifestChange::Unchanged);
        assert_eq!(second.install, InstallOutcome::Skipped);
        assert_eq!(fx.installs(), 1);
    }

    #[tokio::test]
    async fn update_propagates_source_unavailable() {
        let fx = Fixture::new();
        let controller = SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap();

        let err = controller.update(false).await.unwrap_err();
        assert!(
            matches!(err, DaemonError::Sync(SyncError::SourceUnavailable { .. })),
            "got: {err}"
        );
        assert!(!controller.config().record_path().exists());
    }

    #[tokio::test]
    async fn update_propagates_install_failure_without_reloading() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let controller = SyncController::with_reloader(fx.config(false, 1), no_reload()).unwrap();

        let err = controller.update(true).await.unwrap_err();
        assert!(
            matches!(err, DaemonError::Sync(SyncError::InstallFailed { exit_code: Some(1) })),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn update_with_reload_reloads_once_after_change() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let mut reloader = MockReloader::new();
        reloader.expect_reload().times(1).returning(|| Ok(()));
        let controller = SyncController::with_reloader(fx.config(true, 0), reloader).unwrap();

        assert!(controller.update(true).await.unwrap().reloaded);
        let unchanged = controller.update(true).await.unwrap();
        assert_eq!(unchanged.install, InstallOutcome::Verified);
        assert!(!unchanged.reloaded, "verify pass must not reload");
    }

    #[tokio::test]
    async fn reload_failure_propagates_to_caller() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let mut reloader = MockReloader::new();
        reloader.expect_reload().times(1).returning(|| {
            Err(DaemonError::ReloadFailed {
                reason: "exec refused".to_string(),
            })
        });
        let controller = SyncController::with_reloader(fx.config(false, 0), reloader).unwrap();

        let err = controller.update(true).await.unwrap_err();
        assert!(matches!(err, DaemonError::ReloadFailed { .. }), "got: {err}");
    }

    #[test]
    fn update_blocking_runs_a_pass_outside_any_runtime() {
        let fx = Fixture::new();
        fx.publish("requests\n");
        let controller = SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap();

        let outcome = controller.update_blocking(false).unwrap();
        assert_eq!(outcome.install, InstallOutcome::Installed);
        assert_eq!(fx.installs(), 1);
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let fx = Fixture::new();
        let controller = SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap();
        assert!(matches!(controller.start(), Err(DaemonError::NoRuntime)));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let fx = Fixture::new();
        let mut config = fx.config(false, 0);
        config.poll_interval_secs = 0;
        assert!(matches!(
            SyncController::with_reloader(config, no_reload()),
            Err(DaemonError::Config(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn start_is_idempotent_and_stop_ends_the_loop() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let controller = SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap();

        assert!(controller.start().unwrap());
        assert!(!controller.start().unwrap(), "second start must not spawn");
        assert!(controller.is_running());

        assert!(wait_until(Duration::from_secs(5), || fx.installs() == 1).await);

        let stopping = Instant::now();
        controller.stop().await.unwrap();
        assert!(!controller.is_running());
        assert!(
            stopping.elapsed() < Duration::from_millis(900),
            "stop should interrupt the polling sleep"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loop_survives_missing_source_and_picks_it_up_later() {
        let fx = Fixture::new();
        let controller = SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap();
        controller.start().unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(controller.is_running(), "fetch failure must not end the loop");
        assert_eq!(fx.installs(), 0);

        fx.publish("flask==3.0\n");
        assert!(
            wait_until(Duration::from_secs(5), || fx.installs() == 1).await,
            "loop did not install after the source appeared"
        );
        controller.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loop_keeps_running_after_install_failure() {
        let fx = Fixture::new();
        fx.publish("broken==0.0\n");
        let controller = SyncController::with_reloader(fx.config(false, 1), no_reload()).unwrap();
        controller.start().unwrap();

        // Failed content is retried on the following poll.
        assert!(wait_until(Duration::from_secs(5), || fx.installs() >= 2).await);
        assert!(controller.is_running());
        controller.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_install_a_change_once() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let controller =
            Arc::new(SyncController::with_reloader(fx.config(false, 0), no_reload()).unwrap());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let controller = controller.clone();
            handles.push(tokio::spawn(async move { controller.update(false).await }));
        }
        let mut changed = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.change.is_changed() {
                changed += 1;
            }
        }

        assert_eq!(changed, 1);
        assert_eq!(fx.installs(), 1);
        let record = controller.inner.syncer.store().load().unwrap().unwrap();
        assert!(!record.pending_install);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn deferred_start_waits_one_interval() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let mut config = fx.config(false, 0);
        config.run_at_startup = false;
        let controller = SyncController::with_reloader(config, no_reload()).unwrap();
        controller.start().unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fx.installs(), 0, "no pass before the first interval");
        assert!(wait_until(Duration::from_secs(5), || fx.installs() == 1).await);
        controller.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_lets_a_running_install_finish_and_skips_the_reload() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let mut config = fx.slow_config(false);
        config.reload_on_change = true;
        let controller = SyncController::with_reloader(config, no_reload()).unwrap();
        controller.start().unwrap();

        assert!(wait_until(Duration::from_secs(5), || fx.install_starts() == 1).await);
        assert_eq!(fx.installs(), 0, "install still in progress");
        controller.stop().await.unwrap();

        assert_eq!(fx.installs(), 1, "stop must wait for the install to complete");
        assert!(!controller.is_running());
        let record = controller.inner.syncer.store().load().unwrap().unwrap();
        assert!(record.installed_at.is_some());
        assert!(!record.install_failed());

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(fx.install_starts(), 1, "no pass may run after stop");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn restart_while_previous_loop_is_stopping_yields_a_live_loop() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let controller = SyncController::with_reloader(fx.slow_config(false), no_reload()).unwrap();
        assert!(controller.start().unwrap());

        assert!(wait_until(Duration::from_secs(5), || fx.install_starts() == 1).await);
        controller.cancel();
        assert!(controller.start().unwrap(), "a stopping loop must not block a restart");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(controller.is_running(), "restarted loop must still be alive");
        assert_eq!(fx.installs(), 1);

        fx.publish("flask==3.0\n");
        assert!(
            wait_until(Duration::from_secs(5), || fx.installs() == 2).await,
            "restarted loop did not pick up the next change"
        );
        controller.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loop_keeps_running_after_reload_failure() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        let mut config = fx.config(false, 0);
        config.reload_on_change = true;

        let attempts = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut reloader = MockReloader::new();
        let counter = attempts.clone();
        reloader.expect_reload().returning(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(DaemonError::ReloadFailed {
                reason: "exec refused".to_string(),
            })
        });
        let controller = SyncController::with_reloader(config, reloader).unwrap();
        controller.start().unwrap();

        let reloads = || attempts.load(std::sync::atomic::Ordering::SeqCst);
        assert!(wait_until(Duration::from_secs(5), || reloads() == 1).await);
        assert!(controller.is_running(), "reload failure must not end the loop");

        fx.publish("flask==3.0\n");
        assert!(
            wait_until(Duration::from_secs(5), || fx.installs() == 2).await,
            "loop did not install the next change after a failed reload"
        );
        assert!(wait_until(Duration::from_secs(2), || reloads() == 2).await);
        assert!(controller.is_running());
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn successful_retry_of_failed_content_reloads() {
        let fx = Fixture::new();
        fx.publish("flask==2.0\n");
        fs::write(fx.failing_flag(), "").unwrap();
        let mut reloader = MockReloader::new();
        reloader.expect_reload().times(1).returning(|| Ok(()));
        let controller = SyncController::with_reloader(fx.flaky_config(false), reloader).unwrap();

        let err = controller.update(true).await.unwrap_err();
        assert!(
            matches!(err, DaemonError::Sync(SyncError::InstallFailed { .. })),
            "got: {err}"
        );

        fs::remove_file(fx.failing_flag()).unwrap();
        let retried = controller.update(true).await.unwrap();
        assert_eq!(retried.change, ManifestChange::Unchanged);
        assert_eq!(retried.install, InstallOutcome::Retried);
        assert!(retried.reloaded);

        let settled = controller.update(true).await.unwrap();
        assert_eq!(settled.install, InstallOutcome::Skipped);
        assert!(!settled.reloaded);
    }
}
