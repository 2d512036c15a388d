//! Cache Sweeper Task
//!
//! Background task bound to one cache store. It periodically removes expired
//! entries, keeps the multicast invalidation listener running when one is
//! configured, and retires once the store has been idle for the configured
//! window. Retiring drains the whole store.

use std::io::ErrorKind;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::error::CacheError;
use crate::multicast::{InvalidationListener, ListenerHandle};

// == Sweeper Handle ==
/// Owner side of a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    listening: watch::Receiver<bool>,
}

impl SweeperHandle {
    /// Returns true until the sweeper task has exited.
    pub fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }

    /// Returns true while the sweeper holds a running invalidation listener.
    pub fn is_listening(&self) -> bool {
        self.is_alive() && *self.listening.borrow()
    }

    /// Asks the sweeper to drain the store and exit, then waits for it.
    pub async fn stop(self) {
        debug!("Requesting cache sweeper shutdown");
        self.shutdown.send_replace(true);
        if let Err(e) = self.task.await {
            warn!("Cache sweeper ended abnormally: {}", e);
        }
    }
}

/// Spawns a sweeper for `store` on `runtime`.
///
/// The task loops until either a shutdown is requested through the returned
/// handle or the store goes untouched for `config.idle_timeout`. Either way it
/// then drains the store and stops its invalidation listener.
///
/// # Example
/// ```ignore
/// let store = CacheStore::<String>::new(&Config::default());
/// store.store("key", "value".to_string(), Duration::from_secs(60));
/// assert!(store.sweeper_running());
/// ```
pub fn spawn_sweeper<V>(store: CacheStore<V>, runtime: &Handle) -> SweeperHandle
where
    V: Send + Sync + 'static,
{
    let (shutdown, shutdown_rx) = watch::channel(false);
    let (listening_tx, listening) = watch::channel(false);
    let sweeper = Sweeper {
        store,
        passes: 0,
        listener: None,
        listening: listening_tx,
        want_listener: true,
        reported_permission_denied: false,
    };
    let task = runtime.spawn(sweeper.run(shutdown_rx));

    SweeperHandle {
        task,
        shutdown,
        listening,
    }
}

struct Sweeper<V> {
    store: CacheStore<V>,
    passes: u64,
    listener: Option<ListenerHandle>,
    listening: watch::Sender<bool>,
    want_listener: bool,
    // Permission failures repeat on every retry; only the first is logged.
    reported_permission_denied: bool,
}

impl<V: Send + Sync + 'static> Sweeper<V> {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.store.config().sweep_interval;
        let idle_timeout = self.store.config().idle_timeout.as_millis() as u64;

        info!("Starting cache sweeper with interval of {:?}", interval);
        self.check_listener().await;

        loop {
            let stop_requested = tokio::select! {
                _ = tokio::time::sleep(interval) => false,
                // An error means the handle is gone, which is a stop as well
                _ = shutdown.changed() => true,
            };

            if stop_requested {
                info!("Cache sweeper shutdown requested");
                break;
            }
            if self.store.use_age_ms() >= idle_timeout {
                info!("Cache idle for {} ms, retiring sweeper", self.store.use_age_ms());
                break;
            }

            let listener_alive = self
                .listener
                .as_ref()
                .is_some_and(ListenerHandle::is_alive);
            if self.want_listener && !listener_alive {
                self.listening.send_replace(false);
                self.check_listener().await;
            }

            self.sweep_pass();
        }

        self.retire().await;
    }

    fn sweep_pass(&mut self) {
        // Entry and delegate hooks are user code; a panicking hook costs one
        // pass, not the sweeper.
        match catch_unwind(AssertUnwindSafe(|| self.store.sweep_expired())) {
            Ok(removed) if removed > 0 => {
                info!("Cache sweep: removed {} expired entries", removed)
            }
            Ok(_) => debug!("Cache sweep: no expired entries found"),
            Err(_) => warn!("Panic in cache sweep pass, continuing"),
        }
        self.passes += 1;
    }

    /// Starts the invalidation listener if the store has a multicast group.
    async fn check_listener(&mut self) {
        let Some(multicast) = self.store.multicast_config() else {
            self.want_listener = false;
            return;
        };
        self.want_listener = true;

        match InvalidationListener::bind(multicast.group, multicast.port).await {
            Ok(listener) => {
                self.listener = Some(listener.spawn(self.store.clone()));
                self.listening.send_replace(true);
            }
            Err(CacheError::Io(e)) if e.kind() == ErrorKind::PermissionDenied => {
                if !self.reported_permission_denied {
                    error!("Couldn't create multicast listener: {}", e);
                    self.reported_permission_denied = true;
                }
            }
            Err(e) => error!("Couldn't create multicast listener: {}", e),
        }
    }

    async fn retire(mut self) {
        let drained = self.store.drain();

        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
        self.listening.send_replace(false);

        let stats = self.store.stats();
        info!(
            passes = self.passes,
            use_age_ms = self.store.use_age_ms(),
            drained,
            puts = stats.puts,
            watermark = stats.watermark,
            hits = stats.hits,
            misses = stats.misses,
            "Cache sweeper shut down"
        );
    }
}
