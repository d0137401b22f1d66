//! Synthetic time-varying volumes for demos and tests.

use std::f32::consts::TAU;
use std::io;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::volume::{Volume, write_nrrd};

/// Additive Gaussian noise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NoiseSpec {
    /// Standard deviation of the noise.
    pub amplitude: f32,
    /// Random seed; frame `t` uses `seed + t`.
    pub seed: u64,
}

/// A Gaussian sphere orbiting the volume centre in the XY plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticSeries {
    /// Grid size (X, Y, Z).
    pub dimensions: [usize; 3],
    /// Number of time steps; one full orbit over the series.
    pub frames: usize,
    /// Sphere radius as fraction of the smallest dimension.
    pub radius: f32,
    /// Peak amplitude.
    pub amplitude: f32,
    /// Orbit radius as fraction of the smallest dimension.
    pub orbit: f32,
    #[serde(default)]
    pub noise: Option<NoiseSpec>,
}

impl Default for SyntheticSeries {
    fn default() -> Self {
        Self {
            dimensions: [32, 32, 16],
            frames: 12,
            radius: 0.2,
            amplitude: 1.0,
            orbit: 0.25,
            noise: None,
        }
    }
}

impl SyntheticSeries {
    /// Generate time step `t`.
    pub fn frame(&self, t: usize) -> Volume {
        let [width, height, depth] = self.dimensions;
        let min_dim = width.min(height).min(depth).max(1) as f32;

        let theta = TAU * t as f32 / self.frames.max(1) as f32;
        let orbit = self.orbit * min_dim;
        let cx = width as f32 / 2.0 + orbit * theta.cos();
        let cy = height as f32 / 2.0 + orbit * theta.sin();
        let cz = depth as f32 / 2.0;
        let sigma_sq = (self.radius * min_dim / 2.0).powi(2).max(f32::EPSILON);

        let mut values = vec![0.0f32; width * height * depth];
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let dx = x as f32 - cx;
                    let dy = y as f32 - cy;
                    let dz = z as f32 - cz;
                    let dist_sq = dx * dx + dy * dy + dz * dz;
                    values[z * height * width + y * width + x] =
                        self.amplitude * (-dist_sq / (2.0 * sigma_sq)).exp();
                }
            }
        }

        if let Some(noise) = self.noise {
            let mut rng = StdRng::seed_from_u64(noise.seed.wrapping_add(t as u64));
            for v in &mut values {
                let n: f32 = rng.sample(rand_distr::StandardNormal);
                *v += noise.amplitude * n;
            }
        }

        Volume::from_f32(self.dimensions, &values)
    }

    /// File name of time step `t`, zero-padded so name order is time order.
    pub fn frame_name(&self, t: usize) -> String {
        let digits = self.frames.saturating_sub(1).to_string().len().max(3);
        format!("frame_{t:0digits$}.nrrd")
    }

    /// Write every time step into `directory`, creating it if needed.
    pub fn write_to<P: AsRef<Path>>(&self, directory: P) -> io::Result<Vec<PathBuf>> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory)?;
        let mut written = Vec::with_capacity(self.frames);
        for t in 0..self.frames {
            let path = directory.join(self.frame_name(t));
            write_nrrd(&path, &self.frame(t))?;
            log::debug!("Wrote {}", path.display());
            written.push(path);
        }
        log::info!("Wrote {} frames to {}", self.frames, directory.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{FileId, SequenceReader};
    use crate::volume::NrrdDecoder;
    use tempfile::tempdir;

    fn small() -> SyntheticSeries {
        SyntheticSeries {
            dimensions: [16, 16, 4],
            frames: 4,
            ..Default::default()
        }
    }

    fn peak(volume: &Volume) -> (usize, usize) {
        let [w, h, _] = volume.info.dimensions;
        let mut best = (0, 0, f64::MIN);
        for y in 0..h {
            for x in 0..w {
                let v = volume.value_at(x, y, 2).unwrap();
                if v > best.2 {
                    best = (x, y, v);
                }
            }
        }
        (best.0, best.1)
    }

    #[test]
    fn test_sphere_orbits() {
        let series = small();
        let first = series.frame(0);
        let quarter = series.frame(1);
        assert_eq!(first.info.dimensions, [16, 16, 4]);
        assert_eq!(peak(&first), (9, 8));
        assert_eq!(peak(&quarter), (8, 9));

        let (_, max) = first.scalar_range().unwrap();
        assert!(max <= 1.0 && max > 0.5);
    }

    #[test]
    fn test_noise_is_deterministic() {
        let series = SyntheticSeries {
            noise: Some(NoiseSpec {
                amplitude: 0.1,
                seed: 7,
            }),
            ..small()
        };
        assert_eq!(series.frame(2), series.frame(2));
        assert_ne!(series.frame(2).data, small().frame(2).data);
        assert_ne!(series.frame(1).data, series.frame(2).data);
    }

    #[test]
    fn test_frame_names_sort_in_time_order() {
        let series = SyntheticSeries {
            frames: 1200,
            ..Default::default()
        };
        assert_eq!(series.frame_name(7), "frame_0007.nrrd");
        let mut names: Vec<String> = (0..1200).map(|t| series.frame_name(t)).collect();
        let ordered = names.clone();
        names.sort();
        assert_eq!(names, ordered);
        assert_eq!(small().frame_name(3), "frame_003.nrrd");
    }

    #[test]
    fn test_written_series_reads_back_in_order() {
        let dir = tempdir().unwrap();
        let series = small();
        let paths = series.write_to(dir.path().join("series")).unwrap();
        assert_eq!(paths.len(), 4);

        let mut reader = SequenceReader::open_directory(dir.path().join("series"), NrrdDecoder)
            .unwrap();
        assert_eq!(reader.number_of_files(), 4);
        for t in 0..4 {
            reader.set_index(t as i64);
            assert_eq!(
                reader.current_file_name(),
                Some(&FileId::new(series.frame_name(t)))
            );
            let volume = reader.update().unwrap().unwrap();
            assert_eq!(*volume, series.frame(t));
        }
    }
}
