//! Sampler executor: one dedicated thread owns a [`Resampler`] for its whole
//! life and every other thread talks to it through a channel.
//!
//! # Invariants
//! - The resampler is created, used and destroyed on the executor thread.
//! - Requests are served in the order they arrive; a rejected request does
//!   not affect the next one.
//! - Once shut down, every request fails with [`SamplerError::ExecutorClosed`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use volsampler_common::{Pose, SamplerConfig, SamplerError, SamplerResult};
use volsampler_render::{Resampler, SampleBackend, SamplerStats, SoftwareBackend};

const THREAD_NAME: &str = "volsampler";

enum Command {
    Load {
        volume: Vec<u8>,
        reply: Sender<SamplerResult<()>>,
    },
    Sample {
        pose: Pose,
        reply: Sender<SamplerResult<Vec<u8>>>,
    },
    Stats {
        reply: Sender<SamplerStats>,
    },
    Shutdown,
}

/// Cloneable, `Send` front end to a running executor.
#[derive(Clone)]
pub struct SamplerHandle {
    tx: Sender<Command>,
    config: SamplerConfig,
}

impl SamplerHandle {
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Replace the executor's volume. Blocks until the upload finished.
    pub fn load(&self, volume: Vec<u8>) -> SamplerResult<()> {
        self.request(|reply| Command::Load { volume, reply })?
    }

    /// Sample the cube for `pose`. Blocks until the cube is read back.
    pub fn sample(&self, pose: Pose) -> SamplerResult<Vec<u8>> {
        self.request(|reply| Command::Sample { pose, reply })?
    }

    pub fn stats(&self) -> SamplerResult<SamplerStats> {
        self.request(|reply| Command::Stats { reply })
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> SamplerResult<T> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| SamplerError::ExecutorClosed)?;
        rx.recv().map_err(|_| SamplerError::ExecutorClosed)
    }
}

/// Owner of the sampler thread. Dropping it shuts the thread down.
pub struct SamplerExecutor {
    handle: SamplerHandle,
    thread: Option<JoinHandle<()>>,
}

impl SamplerExecutor {
    /// Start the executor thread and build the resampler on it.
    ///
    /// Returns once the resampler exists, or with the error that prevented
    /// its creation.
    pub fn spawn<B, F>(config: SamplerConfig, factory: F) -> SamplerResult<Self>
    where
        B: SampleBackend + 'static,
        F: FnOnce(&SamplerConfig) -> SamplerResult<B> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = mpsc::sync_channel::<SamplerResult<()>>(1);

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let resampler = match Resampler::create(config, factory) {
                    Ok(resampler) => {
                        tracing::debug!(
                            backend = resampler.backend().name(),
                            "sampler thread serving"
                        );
                        let _ = init_tx.send(Ok(()));
                        resampler
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };
                serve(resampler, rx);
            })
            .map_err(|e| {
                SamplerError::ContextUnavailable(format!("failed to spawn sampler thread: {e}"))
            })?;

        let init = init_rx.recv().unwrap_or(Err(SamplerError::ExecutorClosed));
        if let Err(e) = init {
            if thread.join().is_err() {
                tracing::error!("sampler thread panicked during startup");
            }
            return Err(e);
        }

        tracing::info!(thread = THREAD_NAME, "sampler executor started");
        Ok(Self {
            handle: SamplerHandle { tx, config },
            thread: Some(thread),
        })
    }

    /// Executor over the CPU backend.
    pub fn software(config: SamplerConfig) -> SamplerResult<Self> {
        Self::spawn(config, |config| Ok(SoftwareBackend::new(config)))
    }

    pub fn handle(&self) -> SamplerHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.handle.config
    }

    pub fn load(&self, volume: Vec<u8>) -> SamplerResult<()> {
        self.handle.load(volume)
    }

    pub fn sample(&self, pose: Pose) -> SamplerResult<Vec<u8>> {
        self.handle.sample(pose)
    }

    pub fn stats(&self) -> SamplerResult<SamplerStats> {
        self.handle.stats()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Destroy the resampler and join the thread. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.handle.tx.send(Command::Shutdown);
        if let Err(e) = thread.join() {
            tracing::error!(?e, "sampler thread panicked");
        }
        tracing::info!("sampler executor stopped");
    }
}

impl Drop for SamplerExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn serve<B: SampleBackend>(mut resampler: Resampler<B>, rx: Receiver<Command>) {
    while let Ok(command) = rx.recv() {
        match command {
            Command::Load { volume, reply } => {
                let _ = reply.send(resampler.load(&volume));
            }
            Command::Sample { pose, reply } => {
                let _ = reply.send(resampler.sample(&pose));
            }
            Command::Stats { reply } => {
                let _ = reply.send(resampler.stats().clone());
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("sampler thread exiting");
    resampler.destroy();
}

pub fn crate_info() -> &'static str {
    "volsampler-executor v0.1.0"
}
