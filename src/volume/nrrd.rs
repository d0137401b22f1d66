//! NRRD (Nearly Raw Raster Data) reading and writing.
//!
//! Only attached, raw-encoded payloads are decoded:
//!
//! ```text
//! NRRD0004
//! # comment
//! type: float
//! dimension: 3
//! sizes: 64 64 32
//! spacings: 1 1 2
//! space origin: (0,0,0)
//! encoding: raw
//! endian: little
//!
//! <width * height * depth * sizeof(type) bytes>
//! ```
//!
//! Unknown fields and `key:=value` pairs are ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use super::{DecodeError, Readability, ScalarType, Volume, VolumeDecoder, VolumeInfo};

/// Magic prefix of the first header line, followed by a format version digit.
pub const NRRD_MAGIC: &[u8; 7] = b"NRRD000";

/// Longest header line we are willing to buffer.
const MAX_LINE: u64 = 4096;

/// Parsed NRRD header.
#[derive(Debug, Clone)]
pub struct NrrdHeader {
    pub info: VolumeInfo,
    /// Lowercased `encoding` field.
    pub encoding: String,
    /// Payload byte order for multi-byte types.
    pub big_endian: bool,
}

impl NrrdHeader {
    /// Read the full header, leaving `r` positioned at the first payload byte.
    pub fn read_from<R: BufRead>(r: &mut R) -> Result<Self, DecodeError> {
        if !read_magic(r)? {
            return Err(DecodeError::InvalidHeader("missing NRRD magic".into()));
        }
        read_fields(r)
    }

    /// Check that the payload can actually be decoded.
    pub fn check_supported(&self) -> Result<(), DecodeError> {
        if self.encoding != "raw" {
            return Err(DecodeError::Unsupported(format!(
                "encoding '{}'",
                self.encoding
            )));
        }
        Ok(())
    }

    /// Write a header describing `info` as raw little-endian data.
    pub fn write_to<W: Write>(info: &VolumeInfo, w: &mut W) -> io::Result<()> {
        let [sx, sy, sz] = info.spacing;
        let [ox, oy, oz] = info.origin;
        writeln!(w, "NRRD0004")?;
        writeln!(w, "# Written by volseq")?;
        writeln!(w, "type: {}", type_name(info.scalar_type))?;
        writeln!(w, "dimension: 3")?;
        writeln!(w, "space dimension: 3")?;
        writeln!(
            w,
            "sizes: {} {} {}",
            info.dimensions[0], info.dimensions[1], info.dimensions[2]
        )?;
        writeln!(w, "spacings: {} {} {}", sx, sy, sz)?;
        writeln!(w, "space origin: ({},{},{})", ox, oy, oz)?;
        writeln!(w, "encoding: raw")?;
        writeln!(w, "endian: little")?;
        writeln!(w)?;
        Ok(())
    }
}

/// Decoder for raw-encoded NRRD files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NrrdDecoder;

impl NrrdDecoder {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<(BufReader<File>, NrrdHeader), DecodeError> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = NrrdHeader::read_from(&mut reader)?;
        header.check_supported()?;
        Ok((reader, header))
    }
}

impl VolumeDecoder for NrrdDecoder {
    fn probe(&self, path: &Path) -> Readability {
        let Ok(file) = File::open(path) else {
            return Readability::Unreadable;
        };
        let mut reader = BufReader::new(file);
        match read_magic(&mut reader) {
            Ok(true) => {}
            _ => return Readability::Unreadable,
        }
        match read_fields(&mut reader).and_then(|h| h.check_supported()) {
            Ok(()) => Readability::FullyReadable,
            Err(_) => Readability::PartiallyReadable,
        }
    }

    fn read_info(&mut self, path: &Path) -> Result<VolumeInfo, DecodeError> {
        let (_, header) = Self::open(path)?;
        Ok(header.info)
    }

    fn read_data(&mut self, path: &Path, out: &mut Volume) -> Result<(), DecodeError> {
        let (mut reader, header) = Self::open(path)?;
        let expected = header.info.byte_len();

        // Never trust the header for the allocation size
        let remaining = reader
            .get_ref()
            .metadata()?
            .len()
            .saturating_sub(reader.stream_position()?);
        if remaining < expected as u64 {
            out.data.clear();
            return Err(DecodeError::SizeMismatch {
                expected,
                actual: remaining as usize,
            });
        }

        // Reuse the slot's allocation
        out.data.clear();
        out.data.reserve(expected);
        reader.take(expected as u64).read_to_end(&mut out.data)?;
        if out.data.len() != expected {
            let actual = out.data.len();
            out.data.clear();
            return Err(DecodeError::SizeMismatch { expected, actual });
        }

        let size = header.info.scalar_type.size();
        if header.big_endian && size > 1 {
            for voxel in out.data.chunks_exact_mut(size) {
                voxel.reverse();
            }
        }
        out.info = header.info;
        Ok(())
    }
}

/// Write `volume` as a raw little-endian NRRD file.
pub fn write_nrrd<P: AsRef<Path>>(path: P, volume: &Volume) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    NrrdHeader::write_to(&volume.info, &mut writer)?;
    writer.write_all(&volume.data)?;
    writer.flush()
}

fn read_line<R: BufRead>(r: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    buf.clear();
    r.by_ref().take(MAX_LINE).read_until(b'\n', buf)
}

fn read_magic<R: BufRead>(r: &mut R) -> io::Result<bool> {
    let mut line = Vec::new();
    read_line(r, &mut line)?;
    Ok(line.len() > NRRD_MAGIC.len()
        && line.starts_with(NRRD_MAGIC)
        && line[NRRD_MAGIC.len()].is_ascii_digit())
}

fn read_fields<R: BufRead>(r: &mut R) -> Result<NrrdHeader, DecodeError> {
    let mut scalar_type = None;
    let mut dimension = None;
    let mut sizes: Option<Vec<usize>> = None;
    let mut spacings: Option<Vec<f64>> = None;
    let mut origin = [0.0; 3];
    let mut encoding = None;
    let mut big_endian = None;

    let mut buf = Vec::new();
    loop {
        if read_line(r, &mut buf)? == 0 {
            return Err(DecodeError::InvalidHeader(
                "header ended before blank line".into(),
            ));
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            break;
        }
        if line.starts_with('#') || line.contains(":=") {
            continue;
        }
        let Some((key, value)) = line.split_once(": ") else {
            return Err(DecodeError::InvalidHeader(format!("malformed line '{line}'")));
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "type" => scalar_type = Some(parse_type(value)?),
            "dimension" => dimension = Some(parse_usize(key, value)?),
            "sizes" => {
                sizes = Some(
                    value
                        .split_whitespace()
                        .map(|v| parse_usize(key, v))
                        .collect::<Result<_, _>>()?,
                )
            }
            "spacings" => {
                spacings = Some(
                    value
                        .split_whitespace()
                        .map(|v| {
                            v.parse::<f64>()
                                .map(|s| if s.is_finite() { s } else { 1.0 })
                                .map_err(|_| invalid_value(key, v))
                        })
                        .collect::<Result<_, _>>()?,
                )
            }
            "space origin" => origin = parse_vector(value)?,
            "encoding" => encoding = Some(value.to_ascii_lowercase()),
            "endian" => {
                big_endian = Some(match value.to_ascii_lowercase().as_str() {
                    "little" => false,
                    "big" => true,
                    other => return Err(invalid_value(key, other)),
                })
            }
            "data file" | "datafile" => {
                return Err(DecodeError::Unsupported("detached data file".into()));
            }
            _ => {}
        }
    }

    let scalar_type =
        scalar_type.ok_or_else(|| DecodeError::InvalidHeader("missing 'type'".into()))?;
    let dimension =
        dimension.ok_or_else(|| DecodeError::InvalidHeader("missing 'dimension'".into()))?;
    if !(1..=3).contains(&dimension) {
        return Err(DecodeError::Unsupported(format!("dimension {dimension}")));
    }
    let sizes = sizes.ok_or_else(|| DecodeError::InvalidHeader("missing 'sizes'".into()))?;
    if sizes.len() != dimension {
        return Err(DecodeError::InvalidHeader(format!(
            "'sizes' has {} entries for dimension {}",
            sizes.len(),
            dimension
        )));
    }
    if sizes.iter().any(|&n| n == 0) {
        return Err(DecodeError::InvalidHeader("zero entry in 'sizes'".into()));
    }
    if big_endian.is_none() && scalar_type.size() > 1 {
        return Err(DecodeError::InvalidHeader("missing 'endian'".into()));
    }

    let mut info = VolumeInfo {
        dimensions: [1, 1, 1],
        origin,
        scalar_type,
        ..Default::default()
    };
    info.dimensions[..dimension].copy_from_slice(&sizes);
    if let Some(spacings) = spacings {
        for (axis, s) in spacings.into_iter().take(3).enumerate() {
            info.spacing[axis] = s;
        }
    }
    if info.checked_byte_len().is_none() {
        return Err(DecodeError::InvalidHeader(format!(
            "'sizes' {sizes:?} overflow the payload length"
        )));
    }

    Ok(NrrdHeader {
        info,
        encoding: encoding.ok_or_else(|| DecodeError::InvalidHeader("missing 'encoding'".into()))?,
        big_endian: big_endian.unwrap_or(false),
    })
}

fn invalid_value(key: &str, value: &str) -> DecodeError {
    DecodeError::InvalidHeader(format!("invalid {key} '{value}'"))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, DecodeError> {
    value.parse().map_err(|_| invalid_value(key, value))
}

fn parse_vector(value: &str) -> Result<[f64; 3], DecodeError> {
    let inner = value
        .trim()
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| invalid_value("space origin", value))?;
    let mut out = [0.0; 3];
    let mut count = 0;
    for (axis, part) in inner.split(',').enumerate() {
        if axis >= 3 {
            return Err(invalid_value("space origin", value));
        }
        out[axis] = part
            .trim()
            .parse()
            .map_err(|_| invalid_value("space origin", value))?;
        count += 1;
    }
    if count == 0 {
        return Err(invalid_value("space origin", value));
    }
    Ok(out)
}

fn parse_type(value: &str) -> Result<ScalarType, DecodeError> {
    let ty = match value.to_ascii_lowercase().as_str() {
        "signed char" | "int8" | "int8_t" => ScalarType::I8,
        "uchar" | "unsigned char" | "uint8" | "uint8_t" => ScalarType::U8,
        "short" | "short int" | "signed short" | "signed short int" | "int16" | "int16_t" => {
            ScalarType::I16
        }
        "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => {
            ScalarType::U16
        }
        "int" | "signed int" | "int32" | "int32_t" => ScalarType::I32,
        "uint" | "unsigned int" | "uint32" | "uint32_t" => ScalarType::U32,
        "float" => ScalarType::F32,
        "double" => ScalarType::F64,
        other => return Err(DecodeError::Unsupported(format!("type '{other}'"))),
    };
    Ok(ty)
}

fn type_name(ty: ScalarType) -> &'static str {
    match ty {
        ScalarType::I8 => "int8",
        ScalarType::U8 => "uint8",
        ScalarType::I16 => "int16",
        ScalarType::U16 => "uint16",
        ScalarType::I32 => "int32",
        ScalarType::U32 => "uint32",
        ScalarType::F32 => "float",
        ScalarType::F64 => "double",
    }
}
