//! PLY point cloud loader.
//!
//! Reads the `vertex` element of `ascii`, `binary_little_endian` and
//! `binary_big_endian` files. Needs `x y z`; `red green blue` are optional
//! (integer channels are scaled from 0..255, float channels taken as is).
//! Elements before `vertex` are skipped if their size can be determined.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use glam::DVec3;
use log::debug;

use super::point_cloud::{CloudPoint, PointCloud};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    BinaryLe,
    BinaryBe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl Scalar {
    fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "char" | "int8" => Scalar::I8,
            "uchar" | "uint8" => Scalar::U8,
            "short" | "int16" => Scalar::I16,
            "ushort" | "uint16" => Scalar::U16,
            "int" | "int32" => Scalar::I32,
            "uint" | "uint32" => Scalar::U32,
            "float" | "float32" => Scalar::F32,
            "double" | "float64" => Scalar::F64,
            other => bail!("Unknown PLY scalar type '{}'", other),
        })
    }

    fn width(self) -> usize {
        match self {
            Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::F64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, Scalar::F32 | Scalar::F64)
    }

    fn decode(self, b: &[u8], enc: Encoding) -> f64 {
        macro_rules! read {
            ($t:ty, $n:expr) => {{
                let mut arr = [0u8; $n];
                arr.copy_from_slice(&b[..$n]);
                if enc == Encoding::BinaryBe { <$t>::from_be_bytes(arr) as f64 } else { <$t>::from_le_bytes(arr) as f64 }
            }};
        }
        match self {
            Scalar::I8 => b[0] as i8 as f64,
            Scalar::U8 => b[0] as f64,
            Scalar::I16 => read!(i16, 2),
            Scalar::U16 => read!(u16, 2),
            Scalar::I32 => read!(i32, 4),
            Scalar::U32 => read!(u32, 4),
            Scalar::F32 => read!(f32, 4),
            Scalar::F64 => read!(f64, 8),
        }
    }
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, ty: Scalar },
    List { count: Scalar, item: Scalar },
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    props: Vec<Property>,
}

impl Element {
    fn fixed_stride(&self) -> Option<usize> {
        self.props
            .iter()
            .map(|p| match p {
                Property::Scalar { ty, .. } => Some(ty.width()),
                Property::List { .. } => None,
            })
            .sum()
    }

    /// Smallest possible encoded row: lists count as their length prefix.
    fn min_stride(&self) -> usize {
        self.props
            .iter()
            .map(|p| match p {
                Property::Scalar { ty, .. } => ty.width(),
                Property::List { count, .. } => count.width(),
            })
            .sum()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.props
            .iter()
            .position(|p| matches!(p, Property::Scalar { name: n, .. } if n == name))
    }
}

struct Header {
    encoding: Encoding,
    elements: Vec<Element>,
    body_offset: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    const END: &[u8] = b"end_header";
    let end = bytes
        .windows(END.len())
        .position(|w| w == END)
        .ok_or_else(|| anyhow!("PLY header has no end_header"))?;
    let mut body_offset = end + END.len();
    // end_header is followed by \n or \r\n
    if bytes.get(body_offset) == Some(&b'\r') {
        body_offset += 1;
    }
    if bytes.get(body_offset) == Some(&b'\n') {
        body_offset += 1;
    }

    let text = String::from_utf8_lossy(&bytes[..end]);
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    if lines.next() != Some("ply") {
        bail!("Not a PLY file (missing magic)");
    }

    let mut encoding = None;
    let mut elements: Vec<Element> = Vec::new();
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["format", fmt, _version] => {
                encoding = Some(match *fmt {
                    "ascii" => Encoding::Ascii,
                    "binary_little_endian" => Encoding::BinaryLe,
                    "binary_big_endian" => Encoding::BinaryBe,
                    other => bail!("Unsupported PLY format '{}'", other),
                });
            }
            ["comment", ..] | ["obj_info", ..] => {}
            ["element", name, count] => elements.push(Element {
                name: name.to_string(),
                count: count.parse().with_context(|| format!("Bad element count '{}'", count))?,
                props: Vec::new(),
            }),
            ["property", "list", count, item, _name] => {
                let el = elements.last_mut().ok_or_else(|| anyhow!("PLY property before element"))?;
                el.props.push(Property::List { count: Scalar::parse(count)?, item: Scalar::parse(item)? });
            }
            ["property", ty, name] => {
                let el = elements.last_mut().ok_or_else(|| anyhow!("PLY property before element"))?;
                el.props.push(Property::Scalar { name: name.to_string(), ty: Scalar::parse(ty)? });
            }
            _ => debug!("PLY: ignoring header line '{}'", line),
        }
    }

    Ok(Header {
        encoding: encoding.ok_or_else(|| anyhow!("PLY header has no format line"))?,
        elements,
        body_offset,
    })
}

/// Column lookup for the vertex element.
struct VertexLayout {
    xyz: [usize; 3],
    rgb: Option<[usize; 3]>,
    rgb_is_float: bool,
}

impl VertexLayout {
    fn new(el: &Element) -> Result<Self> {
        let need = |n: &str| el.index_of(n).ok_or_else(|| anyhow!("PLY vertex element has no '{}' property", n));
        let xyz = [need("x")?, need("y")?, need("z")?];
        let rgb = match (el.index_of("red"), el.index_of("green"), el.index_of("blue")) {
            (Some(r), Some(g), Some(b)) => Some([r, g, b]),
            _ => None,
        };
        let rgb_is_float = rgb
            .map(|[r, _, _]| matches!(el.props[r], Property::Scalar { ty, .. } if ty.is_float()))
            .unwrap_or(false);
        Ok(Self { xyz, rgb, rgb_is_float })
    }

    fn point(&self, row: &[f64]) -> CloudPoint {
        let pos = DVec3::new(row[self.xyz[0]], row[self.xyz[1]], row[self.xyz[2]]);
        let color = match self.rgb {
            Some(idx) => {
                let scale = if self.rgb_is_float { 1.0 } else { 1.0 / 255.0 };
                idx.map(|i| (row[i] * scale).clamp(0.0, 1.0) as f32)
            }
            None => [0.8, 0.8, 0.8],
        };
        CloudPoint { pos, color }
    }
}

/// Decode a PLY file held in memory.
pub fn read_ply(bytes: &[u8]) -> Result<PointCloud> {
    let header = parse_header(bytes)?;
    let vertex_pos = header
        .elements
        .iter()
        .position(|e| e.name == "vertex")
        .ok_or_else(|| anyhow!("PLY has no vertex element"))?;
    let vertex = &header.elements[vertex_pos];
    let layout = VertexLayout::new(vertex)?;
    let body = &bytes[header.body_offset..];

    let points = match header.encoding {
        Encoding::Ascii => read_ascii(body, &header.elements[..vertex_pos], vertex, &layout)?,
        enc => read_binary(body, enc, &header.elements[..vertex_pos], vertex, &layout)?,
    };
    debug!("PLY: decoded {} of {} vertices ({:?})", points.len(), vertex.count, header.encoding);
    Ok(PointCloud::new(points))
}

fn read_ascii(body: &[u8], before: &[Element], vertex: &Element, layout: &VertexLayout) -> Result<Vec<CloudPoint>> {
    let text = std::str::from_utf8(body).context("ASCII PLY body is not UTF-8")?;
    let skip = before
        .iter()
        .try_fold(0usize, |acc, e| acc.checked_add(e.count))
        .ok_or_else(|| anyhow!("PLY element counts overflow"))?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty()).skip(skip);

    // Every row takes at least two bytes, whatever the header claims.
    let mut points = Vec::with_capacity(vertex.count.min(text.len() / 2));
    let mut row = Vec::with_capacity(vertex.props.len());
    for i in 0..vertex.count {
        let line = lines.next().ok_or_else(|| anyhow!("PLY truncated at vertex {}", i))?;
        row.clear();
        for tok in line.split_whitespace().take(vertex.props.len()) {
            row.push(tok.parse::<f64>().with_context(|| format!("Bad number '{}' at vertex {}", tok, i))?);
        }
        if row.len() < vertex.props.len() {
            bail!("PLY vertex {} has {} values, expected {}", i, row.len(), vertex.props.len());
        }
        points.push(layout.point(&row));
    }
    Ok(points)
}

fn read_binary(
    body: &[u8],
    enc: Encoding,
    before: &[Element],
    vertex: &Element,
    layout: &VertexLayout,
) -> Result<Vec<CloudPoint>> {
    let mut offset = 0usize;
    for el in before {
        let stride = el
            .fixed_stride()
            .ok_or_else(|| anyhow!("Cannot skip variable-size element '{}' before vertices", el.name))?;
        offset = stride
            .checked_mul(el.count)
            .and_then(|n| offset.checked_add(n))
            .ok_or_else(|| anyhow!("PLY element '{}' size overflows", el.name))?;
    }
    if offset > body.len() {
        bail!("PLY truncated before vertex data");
    }

    let rows_fit = (body.len() - offset) / vertex.min_stride().max(1);
    let mut points = Vec::with_capacity(vertex.count.min(rows_fit));
    let mut row = vec![0.0; vertex.props.len()];
    for i in 0..vertex.count {
        for (slot, prop) in row.iter_mut().zip(&vertex.props) {
            match prop {
                Property::Scalar { ty, .. } => {
                    let b = body
                        .get(offset..offset + ty.width())
                        .ok_or_else(|| anyhow!("PLY truncated at vertex {}", i))?;
                    *slot = ty.decode(b, enc);
                    offset += ty.width();
                }
                Property::List { count, item } => {
                    let b = body
                        .get(offset..offset + count.width())
                        .ok_or_else(|| anyhow!("PLY truncated at vertex {}", i))?;
                    let n = count.decode(b, enc).max(0.0) as usize;
                    offset = n
                        .checked_mul(item.width())
                        .and_then(|len| len.checked_add(offset + count.width()))
                        .ok_or_else(|| anyhow!("PLY list size overflows at vertex {}", i))?;
                    *slot = 0.0;
                }
            }
        }
        points.push(layout.point(&row));
    }
    Ok(points)
}

/// Load a PLY file from disk.
pub fn load_ply(path: &Path) -> Result<PointCloud> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    read_ply(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_with_colors() {
        let data = b"ply\nformat ascii 1.0\ncomment test\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nproperty uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n0 1 2 255 0 0\n-1 -2 -3 0 0 255\n";
        let cloud = read_ply(data).expect("ascii ply");
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.points()[0].pos, DVec3::new(0.0, 1.0, 2.0));
        assert_eq!(cloud.points()[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(cloud.points()[1].color, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_binary_le_without_colors() {
        let mut data = b"ply\r\nformat binary_little_endian 1.0\r\nelement vertex 2\r\nproperty double x\r\nproperty double y\r\nproperty double z\r\nend_header\r\n".to_vec();
        for v in [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let cloud = read_ply(&data).expect("binary ply");
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.points()[1].pos, DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(cloud.points()[1].color, [0.8, 0.8, 0.8]);
    }

    #[test]
    fn test_binary_float_colors_and_list() {
        let mut data = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nproperty list uchar int extra\nproperty float red\nproperty float green\nproperty float blue\nend_header\n".to_vec();
        for v in [1.0f32, 1.0, 1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.push(2);
        data.extend_from_slice(&7i32.to_le_bytes());
        data.extend_from_slice(&8i32.to_le_bytes());
        for v in [0.5f32, 0.25, 1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let cloud = read_ply(&data).expect("binary ply");
        assert_eq!(cloud.points()[0].color, [0.5, 0.25, 1.0]);
    }

    #[test]
    fn test_truncated_and_bad_headers() {
        let truncated = b"ply\nformat binary_little_endian 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nend_header\n\0\0\0\0";
        assert!(read_ply(truncated).is_err());
        assert!(read_ply(b"not a ply").is_err());
        let no_z = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nend_header\n1 2\n";
        assert!(read_ply(no_z).is_err());
    }

    #[test]
    fn test_huge_vertex_count_is_an_error() {
        let binary = b"ply\nformat binary_little_endian 1.0\nelement vertex 18446744073709551615\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
        let err = read_ply(binary).expect_err("oversized count");
        assert!(err.to_string().contains("truncated"), "{}", err);

        let ascii = b"ply\nformat ascii 1.0\nelement vertex 18446744073709551615\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        assert!(read_ply(ascii).is_err());
    }

    #[test]
    fn test_skipped_element_size_overflow() {
        let data = b"ply\nformat binary_little_endian 1.0\nelement face 18446744073709551615\nproperty double a\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n";
        assert!(read_ply(data).is_err());
    }
}
