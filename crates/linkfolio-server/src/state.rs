use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use linkfolio_core::{event::RecordCommand, store::EventStore};
use linkfolio_duckdb::DuckDbBackend;

use crate::{auth::jwt::JwtSessionVerifier, config::Config};

/// Requests per IP per window on the record endpoints.
const RECORD_RATE_LIMIT: usize = 60;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// A failed flush puts its batch back, keeping at most this many multiples
/// of `buffer_max_size` pending.
const REQUEUE_FACTOR: usize = 10;

/// Shared application state injected into every axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Event store the record buffer flushes into and reports read from.
    pub store: Arc<dyn EventStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Verifies dashboard session tokens.
    pub sessions: Arc<JwtSessionVerifier>,

    /// Pending record commands from the public page.
    ///
    /// Lock, drain, release, then flush to the store. The lock is held only
    /// long enough to `std::mem::take` the buffer so the DB write does not
    /// block incoming record requests.
    pub buffer: Arc<Mutex<Vec<RecordCommand>>>,

    /// Per-IP sliding-window rate limiter for the record endpoints.
    ///
    /// Key: IP address string. Value: request timestamps within the last
    /// window. Keys with no recent requests are swept by
    /// [`AppState::sweep_rate_limiter`].
    rate_limiter: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    ///
    /// Without a configured session secret a random one is generated, so
    /// tokens stop verifying after a restart.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let secret = match &config.session_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("LINKFOLIO_SESSION_SECRET not set; using a per-process random secret");
                rand_hex(32)
            }
        };
        Self::with_store(Arc::new(db), config, secret)
    }

    pub fn with_store(store: Arc<dyn EventStore>, config: Config, secret: String) -> Self {
        Self {
            store,
            config: Arc::new(config),
            sessions: Arc::new(JwtSessionVerifier::new(secret)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            rate_limiter: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether `ip` is within the per-minute record limit.
    ///
    /// Returns `true` if the request should proceed, `false` if it should be
    /// rejected with 429. Slides the window on every call.
    pub async fn check_rate_limit(&self, ip: &str) -> bool {
        let mut map = self.rate_limiter.lock().await;
        let window = map.entry(ip.to_string()).or_default();
        let now = Instant::now();
        let cutoff = now.checked_sub(RATE_LIMIT_WINDOW);
        while window
            .front()
            .is_some_and(|t| cutoff.is_some_and(|c| *t < c))
        {
            window.pop_front();
        }
        if window.len() >= RECORD_RATE_LIMIT {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Drop limiter entries whose newest request is older than the window.
    pub async fn sweep_rate_limiter(&self) {
        let Some(cutoff) = Instant::now().checked_sub(RATE_LIMIT_WINDOW) else {
            return;
        };
        let mut map = self.rate_limiter.lock().await;
        let before = map.len();
        map.retain(|_, window| window.back().is_some_and(|t| *t >= cutoff));
        let swept = before - map.len();
        if swept > 0 {
            debug!(swept, remaining = map.len(), "Swept idle rate limiter keys");
        }
    }

    #[cfg(test)]
    async fn rate_limited_clients(&self) -> usize {
        self.rate_limiter.lock().await.len()
    }

    /// Append `commands` to the buffer, flushing immediately once it reaches
    /// `config.buffer_max_size`.
    pub async fn push_commands(&self, commands: Vec<RecordCommand>) {
        let should_flush = {
            let mut buf = self.buffer.lock().await;
            buf.extend(commands);
            buf.len() >= self.config.buffer_max_size
        };

        if should_flush {
            self.flush_buffer().await;
        }
    }

    /// Drain the buffer and write all pending commands to the store.
    ///
    /// On failure the batch goes back to the front of the buffer to be
    /// retried on the next flush. Past the requeue cap the oldest commands
    /// are dropped.
    pub async fn flush_buffer(&self) {
        let batch: Vec<RecordCommand> = {
            let mut buf = self.buffer.lock().await;
            std::mem::take(&mut *buf)
        };

        if batch.is_empty() {
            return;
        }

        match self.store.record(&batch).await {
            Ok(()) => {
                info!(count = batch.len(), "Record buffer flushed");
            }
            Err(e) => {
                error!(count = batch.len(), error = %e, "Record buffer flush failed, requeueing");
                self.requeue(batch).await;
            }
        }
    }

    async fn requeue(&self, mut batch: Vec<RecordCommand>) {
        let cap = self.config.buffer_max_size.saturating_mul(REQUEUE_FACTOR);
        let mut buf = self.buffer.lock().await;
        batch.append(&mut buf);
        if batch.len() > cap {
            let dropped = batch.len() - cap;
            batch.drain(..dropped);
            error!(dropped, "Record buffer over requeue cap, oldest events lost");
        }
        *buf = batch;
    }

    /// Background loop: flush the buffer on a fixed interval and sweep idle
    /// rate limiter keys.
    ///
    /// Spawned as a `tokio::spawn` task in `main.rs`. Runs until the process
    /// exits.
    pub async fn run_buffer_flush_loop(self: Arc<Self>) {
        let interval = self.config.buffer_flush_interval();
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.flush_buffer().await;
            self.sweep_rate_limiter().await;
        }
    }
}

/// Generate a cryptographically random hex string of `n` bytes (2n hex chars).
pub(crate) fn rand_hex(n: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
