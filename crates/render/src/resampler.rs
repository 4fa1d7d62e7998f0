use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use volsampler_common::{Pose, SamplerConfig, SamplerError, SamplerResult};
use volsampler_kernel::sample_transform;

use crate::backend::{SampleBackend, SoftwareBackend};

/// Counters for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct SamplerStats {
    pub loads: u64,
    pub samples: u64,
    pub last_sample_time: Duration,
    pub total_sample_time: Duration,
}

impl SamplerStats {
    pub fn average_sample_time(&self) -> Duration {
        if self.samples == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_sample_time.as_nanos() / u128::from(self.samples);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Oriented volume resampler over one backend.
///
/// The resampler is bound to the thread that created it. Every operation
/// checks the calling thread first and fails with
/// [`SamplerError::ThreadMismatch`] without touching the backend, so a
/// rejected call never disturbs a later one from the owning thread.
pub struct Resampler<B: SampleBackend> {
    config: SamplerConfig,
    backend: B,
    owner: ThreadId,
    volume_loaded: bool,
    released: bool,
    stats: SamplerStats,
}

impl<B: SampleBackend> Resampler<B> {
    /// Validate `config`, then build the backend with `factory`.
    ///
    /// An invalid configuration is rejected before the factory runs, so no
    /// device resource is ever created for it.
    pub fn create<F>(config: SamplerConfig, factory: F) -> SamplerResult<Self>
    where
        F: FnOnce(&SamplerConfig) -> SamplerResult<B>,
    {
        config.validate()?;
        let backend = factory(&config)?;
        tracing::info!(
            backend = backend.name(),
            cube = config.cube_size,
            volume = config.volume_size,
            view = config.view_size,
            "resampler created"
        );
        Ok(Self {
            config,
            backend,
            owner: thread::current().id(),
            volume_loaded: false,
            released: false,
            stats: SamplerStats::default(),
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn volume_loaded(&self) -> bool {
        self.volume_loaded
    }

    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    /// Replace the volume. `volume` must hold exactly `volume_size^3` bytes.
    pub fn load(&mut self, volume: &[u8]) -> SamplerResult<()> {
        self.check_thread()?;
        let _span = tracing::info_span!("load", backend = self.backend.name()).entered();

        let expected = self.config.volume_len();
        if volume.len() != expected {
            return Err(SamplerError::SizeMismatch {
                what: "volume",
                expected,
                actual: volume.len(),
            });
        }

        if let Err(e) = self.backend.load_volume(volume) {
            self.volume_loaded = false;
            return Err(e);
        }
        self.volume_loaded = true;
        self.stats.loads += 1;
        tracing::debug!(bytes = volume.len(), "volume loaded");
        Ok(())
    }

    /// Sample the cube for `pose` into `out`, in `[i][j][k]` lattice order.
    pub fn sample_into(&mut self, pose: &Pose, out: &mut [u8]) -> SamplerResult<()> {
        self.check_thread()?;
        let _span = tracing::info_span!("sample", backend = self.backend.name()).entered();

        if !self.volume_loaded {
            return Err(SamplerError::NoVolumeLoaded);
        }
        let expected = self.config.cube_len();
        if out.len() != expected {
            return Err(SamplerError::SizeMismatch {
                what: "output cube",
                expected,
                actual: out.len(),
            });
        }
        pose.validate()?;

        let start = Instant::now();
        let transform = sample_transform(pose, &self.config);
        self.backend.sample_into(&transform, out)?;

        let elapsed = start.elapsed();
        self.stats.samples += 1;
        self.stats.last_sample_time = elapsed;
        self.stats.total_sample_time += elapsed;
        tracing::debug!(?pose, ?elapsed, "cube sampled");
        Ok(())
    }

    /// Sample the cube for `pose` into a freshly allocated buffer.
    pub fn sample(&mut self, pose: &Pose) -> SamplerResult<Vec<u8>> {
        let mut cube = vec![0u8; self.config.cube_len()];
        self.sample_into(pose, &mut cube)?;
        Ok(cube)
    }

    /// Release every backend resource now.
    pub fn destroy(mut self) {
        self.release_backend();
    }

    fn release_backend(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.volume_loaded = false;
        self.backend.release();
        tracing::info!(
            backend = self.backend.name(),
            loads = self.stats.loads,
            samples = self.stats.samples,
            "resampler destroyed"
        );
    }

    fn check_thread(&self) -> SamplerResult<()> {
        let caller = thread::current().id();
        if caller != self.owner {
            tracing::error!(owner = ?self.owner, ?caller, "cross-thread resampler call");
            return Err(SamplerError::ThreadMismatch {
                owner: self.owner,
                caller,
            });
        }
        Ok(())
    }
}

impl Resampler<SoftwareBackend> {
    /// Resampler over the CPU backend.
    pub fn software(config: SamplerConfig) -> SamplerResult<Self> {
        Self::create(config, |config| Ok(SoftwareBackend::new(config)))
    }
}

impl<B: SampleBackend> Drop for Resampler<B> {
    fn drop(&mut self) {
        self.release_backend();
    }
}
