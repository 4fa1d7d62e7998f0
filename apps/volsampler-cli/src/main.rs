mod volume;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::Vec3;
use tracing_subscriber::EnvFilter;
use volsampler_common::{Pose, SamplerConfig};
use volsampler_executor::SamplerExecutor;
use volsampler_render_wgpu::{WgpuBackend, probe_adapter};

use crate::volume::Pattern;

#[derive(Parser)]
#[command(name = "volsampler-cli", about = "Sample oriented cubes out of 3D volumes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with a serialized sampler configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions, the active configuration and the GPU adapter
    Info,
    /// Sample one pose and write the raw cube to a file
    Sample {
        /// Raw u8 volume file, x fastest
        #[arg(short, long, conflicts_with = "generate")]
        input: Option<PathBuf>,
        /// Generate the volume instead of reading it
        #[arg(short, long, value_enum, default_value = "gradient")]
        generate: Pattern,
        /// Where to write the cube
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "gpu")]
        backend: Backend,
        #[arg(long, default_value = "42")]
        seed: u64,
        #[command(flatten)]
        pose: PoseArgs,
    },
    /// Repeat load and sample over a random volume and report timings
    Bench {
        #[arg(short = 'n', long, default_value = "1000")]
        iterations: u32,
        #[arg(short, long, value_enum, default_value = "gpu")]
        backend: Backend,
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// Sample the same pose with both backends and report the largest difference
    Compare {
        #[arg(short, long, value_enum, default_value = "gradient")]
        generate: Pattern,
        #[arg(long, default_value = "42")]
        seed: u64,
        #[command(flatten)]
        pose: PoseArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Gpu,
    Cpu,
}

#[derive(Args)]
struct PoseArgs {
    /// Cube center in voxels, `x,y,z`; defaults to the volume center
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    center: Option<Vec<f32>>,
    /// Rotation axis azimuth in radians
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    phi: f32,
    /// Rotation axis polar angle in radians
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    theta: f32,
    /// Rotation angle about the axis in radians
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    kappa: f32,
    #[arg(long, default_value = "1")]
    scale: f32,
}

impl PoseArgs {
    fn to_pose(&self, config: &SamplerConfig) -> anyhow::Result<Pose> {
        let center = match self.center.as_deref() {
            None => Pose::centered(config).center,
            Some(&[x, y, z]) => Vec3::new(x, y, z),
            Some(values) => bail!("--center takes x,y,z, got {} values", values.len()),
        };
        Ok(Pose::new(center, self.phi, self.theta, self.kappa, self.scale))
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SamplerConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SamplerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn start(backend: Backend, config: SamplerConfig) -> anyhow::Result<SamplerExecutor> {
    let executor = match backend {
        Backend::Gpu => SamplerExecutor::spawn(config, WgpuBackend::new),
        Backend::Cpu => SamplerExecutor::software(config),
    };
    executor.with_context(|| format!("starting {backend:?} sampler"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("volsampler-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", volsampler_common::crate_info());
            println!("kernel: {}", volsampler_kernel::crate_info());
            println!("render: {}", volsampler_render::crate_info());
            println!("render-wgpu: {}", volsampler_render_wgpu::crate_info());
            println!("executor: {}", volsampler_executor::crate_info());
            println!("config: {}", serde_json::to_string(&config)?);
            match probe_adapter() {
                Some(info) => println!("adapter: {} ({:?})", info.name, info.backend),
                None => println!("adapter: none"),
            }
        }
        Commands::Sample {
            input,
            generate,
            output,
            backend,
            seed,
            pose,
        } => {
            let data = match input {
                Some(path) => volume::read_raw(&path, &config)?,
                None => volume::generate(generate, &config, seed),
            };
            let pose = pose.to_pose(&config)?;

            let executor = start(backend, config)?;
            executor.load(data)?;
            let cube = executor.sample(pose)?;
            volume::write_raw(&output, &cube)?;

            let stats = executor.stats()?;
            println!(
                "Sampled {} bytes with {backend:?} in {:?} -> {}",
                cube.len(),
                stats.last_sample_time,
                output.display()
            );
        }
        Commands::Bench {
            iterations,
            backend,
            seed,
        } => {
            let executor = start(backend, config)?;
            let data = volume::generate(Pattern::Random, &config, seed);
            let pose = Pose::centered(&config);

            println!("Bench: {iterations} x (load + sample), {backend:?} backend");
            let began = Instant::now();
            for i in 0..iterations {
                executor.load(data.clone())?;
                executor.sample(pose)?;
                if (i + 1) % 100 == 0 {
                    tracing::info!(iteration = i + 1, "bench progress");
                }
            }
            let elapsed = began.elapsed();

            let stats = executor.stats()?;
            println!(
                "  total: {elapsed:?}, per iteration: {:?}",
                elapsed / iterations.max(1)
            );
            println!(
                "  sample only: avg {:?} over {} samples",
                stats.average_sample_time(),
                stats.samples
            );
        }
        Commands::Compare {
            generate,
            seed,
            pose,
        } => {
            let data = volume::generate(generate, &config, seed);
            let pose = pose.to_pose(&config)?;

            let gpu = start(Backend::Gpu, config)?;
            gpu.load(data.clone())?;
            let hardware = gpu.sample(pose)?;

            let cpu = start(Backend::Cpu, config)?;
            cpu.load(data)?;
            let software = cpu.sample(pose)?;

            let worst = volume::max_abs_diff(&hardware, &software);
            let differing = hardware.iter().zip(&software).filter(|(a, b)| a != b).count();
            println!(
                "Compare: max abs diff {worst}, {differing} of {} elements differ",
                hardware.len()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_sample_flags() {
        let cli = Cli::try_parse_from([
            "volsampler-cli",
            "sample",
            "--output",
            "cube.raw",
            "--backend",
            "cpu",
            "--center",
            "1,2,3",
            "--kappa",
            "-0.5",
        ])
        .unwrap();
        let Commands::Sample { backend, pose, .. } = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(backend, Backend::Cpu);
        let pose = pose.to_pose(&SamplerConfig::default()).unwrap();
        assert_eq!(pose.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.kappa, -0.5);
    }

    fn compare_center(args: &[&str]) -> anyhow::Result<Pose> {
        let cli = Cli::try_parse_from(["volsampler-cli", "compare"].iter().chain(args))?;
        let Commands::Compare { pose, .. } = cli.command else {
            panic!("expected compare");
        };
        pose.to_pose(&SamplerConfig::default())
    }

    #[test]
    fn center_accepts_comma_separated_forms() {
        for (args, expected) in [
            (&["--center", "4,-5,6.5"][..], Vec3::new(4.0, -5.0, 6.5)),
            (&["--center=4,-5,6.5"][..], Vec3::new(4.0, -5.0, 6.5)),
            (&["--center", "-4,5,6"][..], Vec3::new(-4.0, 5.0, 6.0)),
        ] {
            assert_eq!(compare_center(args).unwrap().center, expected, "{args:?}");
        }
    }

    #[test]
    fn center_with_wrong_value_count_is_rejected() {
        for args in [&["--center", "1,2"][..], &["--center", "1,2,3,4"][..]] {
            let err = compare_center(args).unwrap_err();
            assert!(err.to_string().contains("x,y,z"), "{args:?}: {err}");
        }
    }

    #[test]
    fn missing_center_uses_volume_center() {
        let cli = Cli::try_parse_from(["volsampler-cli", "compare"]).unwrap();
        let Commands::Compare { pose, .. } = cli.command else {
            panic!("expected compare");
        };
        let config = SamplerConfig::new(4, 16, 8);
        assert_eq!(pose.to_pose(&config).unwrap().center, Vec3::splat(8.0));
    }

    #[test]
    fn bench_defaults_to_a_thousand_iterations() {
        let cli = Cli::try_parse_from(["volsampler-cli", "bench"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Bench {
                iterations: 1000,
                ..
            }
        ));
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"cube_size":4,"volume_size":16,"view_size":8}"#).unwrap();
        assert_eq!(
            load_config(Some(good.as_path())).unwrap(),
            SamplerConfig::new(4, 16, 8)
        );

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"cube_size":4,"volume_size":16,"view_size":16}"#).unwrap();
        assert!(load_config(Some(bad.as_path())).is_err());

        assert_eq!(load_config(None).unwrap(), SamplerConfig::default());
    }

    #[test]
    fn cpu_sample_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = SamplerConfig::new(4, 4, 8);
        let executor = start(Backend::Cpu, config).unwrap();
        let data: Vec<u8> = (0..64u32).map(|i| (i * 3) as u8).collect();
        executor.load(data.clone()).unwrap();
        let cube = executor.sample(Pose::at(Vec3::splat(2.5))).unwrap();

        let out = dir.path().join("cube.raw");
        volume::write_raw(&out, &cube).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), data);
    }
}
