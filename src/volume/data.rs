//! Decoded volume container.
//!
//! Voxels are kept as little-endian bytes of the declared [`ScalarType`],
//! indexed as `z * height * width + y * width + x`.

/// Voxel scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarType {
    #[default]
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ScalarType {
    /// Size of one voxel in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Read one little-endian value as f64.
    fn read_le(self, b: &[u8]) -> f64 {
        match self {
            ScalarType::U8 => b[0] as f64,
            ScalarType::I8 => b[0] as i8 as f64,
            ScalarType::U16 => u16::from_le_bytes([b[0], b[1]]) as f64,
            ScalarType::I16 => i16::from_le_bytes([b[0], b[1]]) as f64,
            ScalarType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::I32 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::F64 => {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
        }
    }
}

/// Volume metadata: everything the information phase can answer.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeInfo {
    /// Grid size (X, Y, Z). 2D images have depth 1.
    pub dimensions: [usize; 3],
    /// Physical distance between voxel centres along each axis.
    pub spacing: [f64; 3],
    /// Physical position of voxel (0, 0, 0).
    pub origin: [f64; 3],
    /// Voxel scalar type.
    pub scalar_type: ScalarType,
}

impl Default for VolumeInfo {
    fn default() -> Self {
        Self {
            dimensions: [0, 0, 0],
            spacing: [1.0, 1.0, 1.0],
            origin: [0.0, 0.0, 0.0],
            scalar_type: ScalarType::U8,
        }
    }
}

impl VolumeInfo {
    /// Total number of voxels, saturating at `usize::MAX`.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.dimensions.iter().fold(1usize, |n, &d| n.saturating_mul(d))
    }

    /// Size of the voxel payload in bytes, saturating at `usize::MAX`.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.checked_byte_len().unwrap_or(usize::MAX)
    }

    /// Size of the voxel payload in bytes, `None` if it does not fit in `usize`.
    pub fn checked_byte_len(&self) -> Option<usize> {
        self.dimensions
            .iter()
            .try_fold(self.scalar_type.size(), |n, &d| n.checked_mul(d))
    }

    /// Check if this is a 3D volume (depth > 1).
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.dimensions[2] > 1
    }

    /// Physical bounds as `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn bounds(&self) -> [f64; 6] {
        let mut bounds = [0.0; 6];
        for axis in 0..3 {
            let extent = self.dimensions[axis].saturating_sub(1) as f64 * self.spacing[axis];
            let a = self.origin[axis];
            let b = a + extent;
            bounds[axis * 2] = a.min(b);
            bounds[axis * 2 + 1] = a.max(b);
        }
        bounds
    }
}

/// A fully materialized volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Volume {
    pub info: VolumeInfo,
    /// Little-endian voxel bytes, `info.byte_len()` long.
    pub data: Vec<u8>,
}

impl Volume {
    /// Build an F32 volume from voxel values.
    pub fn from_f32(dimensions: [usize; 3], values: &[f32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        if cfg!(target_endian = "little") {
            data.extend_from_slice(bytemuck::cast_slice(values));
        } else {
            for v in values {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        Self {
            info: VolumeInfo {
                dimensions,
                scalar_type: ScalarType::F32,
                ..Default::default()
            },
            data,
        }
    }

    /// Build a U8 volume from voxel values.
    pub fn from_u8(dimensions: [usize; 3], values: Vec<u8>) -> Self {
        Self {
            info: VolumeInfo {
                dimensions,
                scalar_type: ScalarType::U8,
                ..Default::default()
            },
            data: values,
        }
    }

    /// Convert (x, y, z) coordinates to flat voxel index.
    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        let [w, h, _] = self.info.dimensions;
        z * h * w + y * w + x
    }

    /// Voxel value at (x, y, z), or `None` outside the grid.
    pub fn value_at(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        let [w, h, d] = self.info.dimensions;
        if x >= w || y >= h || z >= d {
            return None;
        }
        let size = self.info.scalar_type.size();
        let start = self.idx(x, y, z) * size;
        self.data
            .get(start..start + size)
            .map(|b| self.info.scalar_type.read_le(b))
    }

    /// Minimum and maximum voxel value. `None` for an empty volume.
    pub fn scalar_range(&self) -> Option<(f64, f64)> {
        let scalar_type = self.info.scalar_type;
        self.data
            .chunks_exact(scalar_type.size())
            .map(|b| scalar_type.read_le(b))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Heap bytes held by the voxel buffer.
    pub fn footprint(&self) -> usize {
        self.data.len()
    }
}
