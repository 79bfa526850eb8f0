//! STL (Stereolithography) file format support.
//!
//! # Encoding Detection
//!
//! Many binary exporters put the word `solid` at the start of the 80-byte
//! header, so the keyword alone is not trusted. A buffer is treated as binary
//! when its length matches the triangle count declared at offset 80
//! (`84 + 50 * count`); otherwise it is parsed as ASCII if it starts with
//! `solid`, and as binary as a last resort.
//!
//! # Binary Layout
//!
//! ```text
//! UINT8[80]    - Header (ignored)
//! UINT32       - Number of triangles
//! foreach triangle
//!     REAL32[3] - Normal vector (ignored, recomputed from winding)
//!     REAL32[3] - Vertex 1
//!     REAL32[3] - Vertex 2
//!     REAL32[3] - Vertex 3
//!     UINT16    - Attribute byte count
//! end
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Point3, Triangle, Vector3};
use tracing::debug;

use crate::error::{IoError, IoResult};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// STL encoding used when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StlEncoding {
    /// Compact little-endian binary.
    #[default]
    Binary,
    /// Human-readable `solid … endsolid` text.
    Ascii,
}

/// Loads a mesh from an STL file, detecting the encoding.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] for missing files and a content error if
/// the bytes are not a valid STL.
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| IoError::from_open(e, path))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let mesh = read_stl(&bytes)?;
    debug!(
        path = %path.display(),
        faces = mesh.face_count(),
        "Loaded STL"
    );
    Ok(mesh)
}

/// Parses an in-memory STL buffer.
///
/// # Errors
///
/// Returns an error if the buffer is neither a well-formed binary nor ASCII STL.
pub fn read_stl(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if declared_binary_len(bytes) == Some(bytes.len()) {
        return read_binary(bytes);
    }

    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    if String::from_utf8_lossy(head).trim_start().starts_with("solid") {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| IoError::invalid_content(format!("ASCII STL is not UTF-8: {e}")))?;
        return read_ascii(text);
    }

    if bytes.len() < HEADER_SIZE + 4 {
        return Err(IoError::invalid_content("file too small to be valid STL"));
    }
    read_binary(bytes)
}

/// Total byte length a binary STL with this header would have.
fn declared_binary_len(bytes: &[u8]) -> Option<usize> {
    let count = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    let count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]);
    (count as usize)
        .checked_mul(TRIANGLE_SIZE)?
        .checked_add(HEADER_SIZE + 4)
}

fn read_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let count_bytes = &bytes[HEADER_SIZE..HEADER_SIZE + 4];
    let declared = u32::from_le_bytes([
        count_bytes[0],
        count_bytes[1],
        count_bytes[2],
        count_bytes[3],
    ]);

    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < declared as usize {
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: available < declared, which is a u32
        let got = available as u32;
        return Err(IoError::Truncated {
            expected: declared,
            got,
        });
    }

    let mut mesh = IndexedMesh::with_capacity(declared as usize * 3, declared as usize);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(declared as usize) {
        // Skip the stored normal (bytes 0..12)
        mesh.push_triangle(
            read_point(&record[12..24]),
            read_point(&record[24..36]),
            read_point(&record[36..48]),
        );
    }
    Ok(mesh)
}

fn read_point(buf: &[u8]) -> Point3<f64> {
    let f = |i: usize| f64::from(f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]));
    Point3::new(f(0), f(4), f(8))
}

fn read_ascii(text: &str) -> IoResult<IndexedMesh> {
    let mut mesh = IndexedMesh::new();
    let mut corners: Vec<Point3<f64>> = Vec::with_capacity(3);
    let mut in_loop = false;

    for line in text.lines() {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let mut coord = || -> IoResult<f64> {
                    let word = words
                        .next()
                        .ok_or_else(|| IoError::invalid_content("vertex with fewer than 3 coordinates"))?;
                    Ok(word.parse()?)
                };
                corners.push(Point3::new(coord()?, coord()?, coord()?));
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                let [v0, v1, v2] = corners[..] else {
                    return Err(IoError::invalid_content(format!(
                        "facet with {} vertices",
                        corners.len()
                    )));
                };
                mesh.push_triangle(v0, v1, v2);
                corners.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    Ok(mesh)
}

/// Saves a mesh to an STL file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, encoding: StlEncoding) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::from_open(e, path))?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, &mut writer, encoding)?;
    writer.flush()?;
    Ok(())
}

/// Writes a mesh as STL to any writer.
///
/// Faces with out-of-range indices are skipped.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stl<W: Write>(mesh: &IndexedMesh, writer: &mut W, encoding: StlEncoding) -> IoResult<()> {
    match encoding {
        StlEncoding::Binary => write_binary(mesh, writer),
        StlEncoding::Ascii => write_ascii(mesh, writer),
    }
}

fn write_binary<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let mut header = [b' '; HEADER_SIZE];
    let text = b"binary STL written by brickscan mesh-io";
    header[..text.len()].copy_from_slice(text);
    writer.write_all(&header)?;

    let triangles: Vec<Triangle> = mesh.triangles().collect();
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: face counts beyond u32 are unsupported by the format
    let face_count = triangles.len() as u32;
    writer.write_all(&face_count.to_le_bytes())?;

    for tri in &triangles {
        let normal = tri.normal().unwrap_or_else(Vector3::zeros);
        write_f32x3(writer, normal.x, normal.y, normal.z)?;
        for v in tri.vertices() {
            write_f32x3(writer, v.x, v.y, v.z)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: the binary format stores f32
fn write_f32x3<W: Write>(writer: &mut W, x: f64, y: f64, z: f64) -> IoResult<()> {
    for value in [x as f32, y as f32, z as f32] {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn write_ascii<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "solid part")?;
    for tri in mesh.triangles() {
        let n = tri.normal().unwrap_or_else(Vector3::zeros);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in tri.vertices() {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid part")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::unit_cube;

    fn encode(mesh: &IndexedMesh, encoding: StlEncoding) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_stl(mesh, &mut bytes, encoding).unwrap();
        bytes
    }

    #[test]
    fn binary_size_matches_face_count() {
        let bytes = encode(&unit_cube(), StlEncoding::Binary);
        assert_eq!(bytes.len(), 84 + 12 * 50);
        assert_eq!(declared_binary_len(&bytes), Some(bytes.len()));
    }

    #[test]
    fn binary_header_starting_with_solid_is_still_binary() {
        let mut bytes = encode(&unit_cube(), StlEncoding::Binary);
        bytes[..5].copy_from_slice(b"solid");
        let mesh = read_stl(&bytes).unwrap();
        assert_eq!(mesh.face_count(), 12);
    }

    #[test]
    fn ascii_facets_are_parsed() {
        let text = b"solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 2.5 0 0
      vertex 0 1e1 0
    endloop
  endfacet
endsolid test";
        let mesh = read_stl(text).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_relative_eq!(mesh.vertices[1].x, 2.5);
        assert_relative_eq!(mesh.vertices[2].y, 10.0);
    }

    #[test]
    fn ascii_short_facet_is_rejected() {
        let text = b"solid bad
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
    endloop
  endfacet
endsolid bad";
        let err = read_stl(text).unwrap_err();
        assert!(matches!(err, IoError::InvalidContent { .. }));
    }

    #[test]
    fn ascii_bad_number_is_rejected() {
        let text = b"solid bad\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        assert!(matches!(read_stl(text), Err(IoError::ParseFloat(_))));
    }

    #[test]
    fn truncated_binary_is_rejected() {
        let mut bytes = encode(&unit_cube(), StlEncoding::Binary);
        bytes.truncate(84 + 3 * 50 + 10);
        assert!(matches!(
            read_stl(&bytes),
            Err(IoError::Truncated { expected: 12, got: 3 })
        ));
    }

    #[test]
    fn tiny_buffer_is_rejected() {
        assert!(matches!(
            read_stl(b"abc"),
            Err(IoError::InvalidContent { .. })
        ));
    }

    #[test]
    fn load_missing_file() {
        let err = load_stl("no_such_part_12345.stl").unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
