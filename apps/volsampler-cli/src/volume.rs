use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use clap::ValueEnum;
use rand::{Rng, SeedableRng, rngs::StdRng};
use volsampler_common::SamplerConfig;

/// Synthetic volume contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    Zeros,
    Random,
    Gradient,
}

pub fn generate(pattern: Pattern, config: &SamplerConfig, seed: u64) -> Vec<u8> {
    let len = config.volume_len();
    match pattern {
        Pattern::Zeros => vec![0; len],
        Pattern::Random => {
            let mut volume = vec![0; len];
            StdRng::seed_from_u64(seed).fill(&mut volume[..]);
            volume
        }
        Pattern::Gradient => {
            // Ramps along x with a slower ramp along z, wrapping every 256.
            let n = config.volume_size as usize;
            (0..len)
                .map(|v| {
                    let x = v % n;
                    let z = v / (n * n);
                    ((x * 256 / n + z) % 256) as u8
                })
                .collect()
        }
    }
}

/// Read a raw x-fastest `u8` volume and check it matches the configured size.
pub fn read_raw(path: &Path, config: &SamplerConfig) -> anyhow::Result<Vec<u8>> {
    let data = fs::read(path).with_context(|| format!("reading volume {}", path.display()))?;
    if data.len() != config.volume_len() {
        bail!(
            "{} holds {} bytes, a {}^3 volume needs {}",
            path.display(),
            data.len(),
            config.volume_size,
            config.volume_len()
        );
    }
    Ok(data)
}

pub fn write_raw(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

/// Largest absolute per-element difference between two cubes.
pub fn max_abs_diff(a: &[u8], b: &[u8]) -> u8 {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SamplerConfig {
        SamplerConfig::new(4, 16, 8)
    }

    #[test]
    fn generated_volumes_have_configured_length() {
        for pattern in [Pattern::Zeros, Pattern::Random, Pattern::Gradient] {
            assert_eq!(generate(pattern, &small(), 1).len(), 16 * 16 * 16);
        }
    }

    #[test]
    fn random_volume_is_seeded() {
        let a = generate(Pattern::Random, &small(), 42);
        let b = generate(Pattern::Random, &small(), 42);
        let c = generate(Pattern::Random, &small(), 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn gradient_increases_along_x() {
        let volume = generate(Pattern::Gradient, &small(), 0);
        assert_eq!(&volume[..4], &[0, 16, 32, 48]);
    }

    #[test]
    fn raw_file_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let volume = generate(Pattern::Gradient, &small(), 0);
        write_raw(tmp.path(), &volume).unwrap();
        assert_eq!(read_raw(tmp.path(), &small()).unwrap(), volume);
    }

    #[test]
    fn raw_file_of_wrong_size_is_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        write_raw(tmp.path(), &[1, 2, 3]).unwrap();
        let err = read_raw(tmp.path(), &small()).unwrap_err();
        assert!(err.to_string().contains("needs 4096"));
    }

    #[test]
    fn diff_of_identical_cubes_is_zero() {
        assert_eq!(max_abs_diff(&[1, 2, 3], &[1, 2, 3]), 0);
        assert_eq!(max_abs_diff(&[1, 200, 3], &[4, 2, 3]), 198);
    }
}
