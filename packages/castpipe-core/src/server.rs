//! Media server lifecycle.
//!
//! A [`MediaServer`] serves one file on one port. Starting it binds the
//! listener on the caller's thread (so bind errors come back from
//! [`MediaServer::start`]) and hands it to a dedicated OS thread running
//! its own multi-threaded Tokio runtime. Long transfers therefore never
//! compete with the caller's executor, and several servers can run side
//! by side on different ports.
//!
//! [`MediaServer::stop`] cancels the serve loop, which closes the
//! listener, then shuts the runtime down with a bounded timeout so
//! in-flight transfers are cut off rather than waited on. It returns only
//! after the worker thread has exited.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

use crate::api::{self, MediaHandler, ServerError};
use crate::context::{FixedIpDetector, IpDetector, LocalIpDetector, NetworkError, UrlBuilder};
use crate::error::ErrorCode;
use crate::media::{file_name_of, resolve_content_type, ServedFile};
use crate::protocol_constants::STOP_TIMEOUT;
use crate::state::Config;

/// One file served on one port.
///
/// Created stopped. To serve a different file, create a new instance.
pub struct MediaServer {
    path: PathBuf,
    file_name: String,
    content_type: String,
    config: Config,
    ip_detector: Arc<dyn IpDetector>,
    worker: Option<ServerWorker>,
}

/// A running server's background thread and its shutdown handle.
struct ServerWorker {
    local_addr: SocketAddr,
    file: Arc<ServedFile>,
    cancel: CancellationToken,
    thread: JoinHandle<()>,
}

impl MediaServer {
    /// Creates a stopped server for `path` on `port` with default settings.
    pub fn new(path: impl Into<PathBuf>, port: u16) -> Self {
        Self::with_config(
            path,
            Config {
                port,
                ..Config::default()
            },
        )
    }

    /// Creates a stopped server for `path` with explicit configuration.
    ///
    /// If `config.advertise_ip` is set it is used in the serving URL;
    /// otherwise the outbound-routable local address is detected.
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        let path = path.into();
        let file_name = file_name_of(&path);
        let content_type = resolve_content_type(&file_name);
        let ip_detector: Arc<dyn IpDetector> = match config.advertise_ip {
            Some(ip) => Arc::new(FixedIpDetector(ip)),
            None => LocalIpDetector::arc(),
        };

        Self {
            path,
            file_name,
            content_type,
            config,
            ip_detector,
            worker: None,
        }
    }

    /// Replaces the detector used to build the serving URL.
    #[must_use]
    pub fn with_ip_detector(mut self, detector: Arc<dyn IpDetector>) -> Self {
        self.ip_detector = detector;
        self
    }

    /// Starts serving on a dedicated background thread.
    ///
    /// # Errors
    ///
    /// - [`ServerError::AlreadyRunning`] if called twice without `stop()`
    /// - [`ServerError::File`] if the file is missing or not a regular file
    /// - [`ServerError::Bind`] if the port cannot be bound
    /// - [`ServerError::Runtime`] if the worker thread or runtime fails to start
    pub fn start(&mut self) -> Result<(), ServerError> {
        self.try_start().inspect_err(|e| {
            log::error!(
                "[Server] Failed to start for {} ({}): {}",
                self.path.display(),
                e.code(),
                e
            );
        })
    }

    fn try_start(&mut self) -> Result<(), ServerError> {
        if self.worker.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        self.config
            .validate()
            .map_err(|msg| ServerError::Runtime(io::Error::new(io::ErrorKind::InvalidInput, msg)))?;

        let file = ServedFile::load(&self.path).map_err(|source| ServerError::File {
            path: self.path.clone(),
            source,
        })?;
        let file = Arc::new(file);

        let addr = SocketAddr::new(self.config.bind_addr, self.config.port);
        let listener = api::bind_listener(addr)?;
        let local_addr = listener.local_addr()?;

        let handler = MediaHandler::new(Arc::clone(&file), self.config.streaming);
        let cancel = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let worker_threads = self.config.worker_threads;

        let thread = thread::Builder::new()
            .name(format!("media-server-{}", local_addr.port()))
            .spawn({
                let cancel = cancel.clone();
                move || run_worker(listener, handler, worker_threads, cancel, ready_tx)
            })?;

        // Wait until the runtime owns the listener before reporting success.
        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(io::Error::other("media server worker exited during startup"))
        });
        if let Err(e) = ready {
            if thread.join().is_err() {
                log::error!("[Server] Worker thread panicked during startup");
            }
            return Err(ServerError::Runtime(e));
        }

        log::info!(
            "[Server] Serving {} ({}, {} bytes) on {}",
            file.path().display(),
            file.content_type(),
            file.size(),
            local_addr
        );

        self.content_type = file.content_type().to_string();
        self.worker = Some(ServerWorker {
            local_addr,
            file,
            cancel,
            thread,
        });
        Ok(())
    }

    /// Stops the server and waits for its worker thread to exit.
    ///
    /// The listener is closed first; in-flight transfers are then given at
    /// most [`STOP_TIMEOUT`] before the runtime is torn down. Calling this on
    /// a stopped server does nothing.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        log::info!("[Server] Stopping media server on {}", worker.local_addr);
        worker.cancel.cancel();

        if worker.thread.join().is_err() {
            log::error!("[Server] Media server thread panicked");
        } else {
            log::info!("[Server] Media server on {} stopped", worker.local_addr);
        }
    }

    /// Whether the server is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// The bound port while running, otherwise the configured port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.worker
            .as_ref()
            .map_or(self.config.port, |worker| worker.local_addr.port())
    }

    /// The bound listener address, if running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.worker.as_ref().map(|worker| worker.local_addr)
    }

    /// The file as captured at start, if running.
    #[must_use]
    pub fn served_file(&self) -> Option<&ServedFile> {
        self.worker.as_ref().map(|worker| worker.file.as_ref())
    }

    /// The path this server was created for.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content type advertised for the served file.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// URL a cast receiver should load: `http://<ip>:<port>/<file-name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if no routable local address can be determined.
    pub fn serving_url(&self) -> Result<String, NetworkError> {
        let ip = self.ip_detector.detect().inspect_err(|e| {
            log::warn!("[Network] No serving address ({}): {}", e.code(), e);
        })?;
        Ok(UrlBuilder::new(ip, self.port()).media_url(&self.file_name))
    }
}

impl Drop for MediaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the worker thread: build a runtime, serve, tear down.
fn run_worker(
    listener: std::net::TcpListener,
    handler: MediaHandler,
    worker_threads: usize,
    cancel: CancellationToken,
    ready: mpsc::SyncSender<io::Result<()>>,
) {
    let runtime = match Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .thread_name("media-worker")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        if let Err(e) = api::serve(listener, handler, cancel).await {
            log::error!("[Server] Media server error: {}", e);
        }
    });

    // Drops connection tasks still streaming; blocking file reads get
    // STOP_TIMEOUT to finish.
    runtime.shutdown_timeout(STOP_TIMEOUT);
    tracing::debug!("media server runtime shut down");
}
