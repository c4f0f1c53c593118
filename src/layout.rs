use glam::Vec3;

use crate::core::Dimensions;

/// Serpentine wiring rules: alternate rows and/or panels run backwards so
/// the strip can snake through the lattice without long return runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Serpentine {
    #[serde(default)]
    pub flip_x_every_row: bool,
    #[serde(default)]
    pub flip_y_every_panel: bool,
}

/// Physical layout of the cube: logical (x,y,z) to linear strip index.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    pub dim: Dimensions,
    pub serpentine: Serpentine,
    /// LED pitch within a panel, millimetres. Currently a hint only.
    pub pitch_mm: f64,
    /// Gap between panels, millimetres. Currently a hint only.
    pub panel_gap_mm: f64,
}

impl Layout {
    pub fn new(dim: Dimensions, serpentine: Serpentine) -> Self {
        Self {
            dim,
            serpentine,
            pitch_mm: 0.0,
            panel_gap_mm: 0.0,
        }
    }

    /// Linear strip index for a logical coordinate.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let mut xx = x;
        let mut yy = y;
        if self.serpentine.flip_x_every_row && y % 2 == 1 {
            xx = self.dim.x - 1 - x;
        }
        if self.serpentine.flip_y_every_panel && z % 2 == 1 {
            yy = self.dim.y - 1 - y;
        }
        z * self.dim.x * self.dim.y + yy * self.dim.x + xx
    }

    pub fn count(&self) -> usize {
        self.dim.count()
    }

    /// Normalized voxel positions in [0,1]^3, one per strip slot: entry `i`
    /// is the spatial position of the LED that slot `i` drives, so scenes
    /// render straight into strip order and the driver writes the buffer
    /// as-is. Axes with a single voxel map to 0.
    pub fn position_lut(&self) -> Vec<Vec3> {
        let norm = |i: usize, n: usize| -> f32 {
            if n <= 1 {
                0.0
            } else {
                i as f32 / (n - 1) as f32
            }
        };

        let mut out = vec![Vec3::ZERO; self.count()];
        for z in 0..self.dim.z {
            for y in 0..self.dim.y {
                for x in 0..self.dim.x {
                    out[self.index(x, y, z)] = Vec3::new(
                        norm(x, self.dim.x),
                        norm(y, self.dim.y),
                        norm(z, self.dim.z),
                    );
                }
            }
        }
        out
    }
}

/// Position LUT for a straight (non-serpentine) layout: raster order,
/// x-fastest.
pub fn build_position_lut(dim: Dimensions) -> Vec<Vec3> {
    Layout::new(dim, Serpentine::default()).position_lut()
}
