use volsampler_common::SamplerConfig;

/// The fixed pairing between lattice points, raster positions and cube-local
/// coordinates.
///
/// Points are enumerated `i, j, k` with `k` innermost. Point `o` sits on
/// raster cell `(o % view_size, o / view_size)` and samples cube-local
/// coordinate `(k, j, i) / cube_size`. Reading the render target back row by
/// row therefore yields the cube in `[i][j][k]` order with no remapping.
#[derive(Debug, Clone)]
pub struct Lattice {
    cube_size: u32,
    view_size: u32,
    raster: Vec<[f32; 2]>,
    local: Vec<[f32; 3]>,
}

impl Lattice {
    /// Pack the lattice for `config`. The configuration must already be
    /// validated.
    pub fn build(config: &SamplerConfig) -> Self {
        let cube = config.cube_size;
        let view = f64::from(config.view_size);
        let len = config.cube_len();

        let mut raster = Vec::with_capacity(len);
        let mut local = Vec::with_capacity(len);

        let mut o: u64 = 0;
        for i in 0..cube {
            for j in 0..cube {
                for k in 0..cube {
                    let col = (o % u64::from(config.view_size)) as f64;
                    let row = (o / u64::from(config.view_size)) as f64;
                    raster.push([
                        (2.0 * (col + 1.0) / view - 1.0) as f32,
                        (2.0 * (row + 1.0) / view - 1.0) as f32,
                    ]);
                    // Axis order is k -> x, j -> y, i -> z.
                    local.push([
                        (f64::from(k) / f64::from(cube)) as f32,
                        (f64::from(j) / f64::from(cube)) as f32,
                        (f64::from(i) / f64::from(cube)) as f32,
                    ]);
                    o += 1;
                }
            }
        }

        tracing::debug!(points = len, cube, view = config.view_size, "lattice packed");

        Self {
            cube_size: cube,
            view_size: config.view_size,
            raster,
            local,
        }
    }

    /// Number of lattice points.
    pub fn len(&self) -> usize {
        self.raster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raster.is_empty()
    }

    /// Normalized device coordinates of every point, in lattice order.
    pub fn raster_positions(&self) -> &[[f32; 2]] {
        &self.raster
    }

    /// Cube-local coordinates in `[0, 1)^3`, in lattice order.
    pub fn local_coords(&self) -> &[[f32; 3]] {
        &self.local
    }

    /// Flat index of lattice point `(i, j, k)`.
    pub fn lattice_index(&self, i: u32, j: u32, k: u32) -> usize {
        let c = self.cube_size as usize;
        (i as usize * c + j as usize) * c + k as usize
    }

    /// Raster cell `(col, row)` of lattice point `o`.
    pub fn raster_cell(&self, o: usize) -> (u32, u32) {
        let view = self.view_size as usize;
        ((o % view) as u32, (o / view) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn small() -> SamplerConfig {
        SamplerConfig::new(4, 16, 8)
    }

    #[test]
    fn one_point_per_pixel() {
        let config = small();
        let lattice = Lattice::build(&config);
        assert_eq!(lattice.len(), config.view_pixels());

        let cells: HashSet<(u32, u32)> = (0..lattice.len()).map(|o| lattice.raster_cell(o)).collect();
        assert_eq!(cells.len(), config.view_pixels());
        assert!(cells.iter().all(|&(c, r)| c < 8 && r < 8));
    }

    #[test]
    fn raster_positions_follow_counter() {
        let lattice = Lattice::build(&small());
        let pos = lattice.raster_positions();
        // o = 0 -> cell (0, 0)
        assert_eq!(pos[0], [2.0 / 8.0 - 1.0, 2.0 / 8.0 - 1.0]);
        // o = 9 -> cell (1, 1)
        assert_eq!(pos[9], [4.0 / 8.0 - 1.0, 4.0 / 8.0 - 1.0]);
        // last point sits on the top-right edge
        assert_eq!(pos[63], [1.0, 1.0]);
    }

    #[test]
    fn local_coords_permute_axes() {
        let lattice = Lattice::build(&small());
        let o = lattice.lattice_index(1, 2, 3);
        assert_eq!(o, 16 + 8 + 3);
        assert_eq!(lattice.local_coords()[o], [0.75, 0.5, 0.25]);
    }

    #[test]
    fn local_coords_stay_in_unit_cube() {
        let lattice = Lattice::build(&SamplerConfig::new(16, 64, 64));
        for c in lattice.local_coords() {
            assert!(c.iter().all(|v| (0.0..1.0).contains(v)));
        }
    }

    #[test]
    fn lattice_index_matches_iteration_order() {
        let lattice = Lattice::build(&small());
        let mut o = 0;
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    assert_eq!(lattice.lattice_index(i, j, k), o);
                    o += 1;
                }
            }
        }
    }
}
