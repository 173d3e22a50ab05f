//! Feature edge extraction
//!
//! Produces the line segments that give outlined models their drawn look:
//! every edge whose two adjacent faces meet at more than a threshold angle,
//! plus every edge that belongs to a single face.

use crate::model::Mesh;
use rustc_hash::FxHashMap;
use vantage_core::Vec3;

/// Quantization applied before merging coincident vertices
const MERGE_PRECISION: f32 = 1e4;

/// First face seen for an edge, waiting for its neighbor
struct OpenEdge {
    a: u32,
    b: u32,
    normal: Vec3,
    matched: bool,
}

fn quantize(p: Vec3) -> (i64, i64, i64) {
    (
        (p.x * MERGE_PRECISION).round() as i64,
        (p.y * MERGE_PRECISION).round() as i64,
        (p.z * MERGE_PRECISION).round() as i64,
    )
}

/// Extract feature edges as a flat list of segment endpoints
///
/// Consecutive pairs of the returned positions form one segment. Faces whose
/// normals differ by at most `threshold_degrees` are treated as one surface.
/// Degenerate triangles and out-of-range indices are skipped.
pub fn extract_edges(mesh: &Mesh, threshold_degrees: f32) -> Vec<Vec3> {
    let threshold_dot = threshold_degrees.to_radians().cos();
    let positions = &mesh.positions;

    let mut merged: FxHashMap<(i64, i64, i64), u32> = FxHashMap::default();
    let merged_ids: Vec<u32> = positions
        .iter()
        .map(|p| {
            let next = merged.len() as u32;
            *merged.entry(quantize(*p)).or_insert(next)
        })
        .collect();

    let mut lookup: FxHashMap<(u32, u32), usize> = FxHashMap::default();
    let mut open: Vec<OpenEdge> = Vec::new();
    let mut segments = Vec::new();
    let mut skipped = 0usize;

    for tri in mesh.indices.chunks_exact(3) {
        let corners = [tri[0], tri[1], tri[2]];
        if corners.iter().any(|&i| i as usize >= positions.len()) {
            skipped += 1;
            continue;
        }
        let ids = corners.map(|i| merged_ids[i as usize]);
        if ids[0] == ids[1] || ids[1] == ids[2] || ids[2] == ids[0] {
            continue;
        }
        let [a, b, c] = corners.map(|i| positions[i as usize]);
        let normal = (b - a).cross(c - a).normalize();
        if normal.length_squared() < 0.5 {
            continue;
        }

        for j in 0..3 {
            let k = (j + 1) % 3;
            let key = (ids[j].min(ids[k]), ids[j].max(ids[k]));
            match lookup.get(&key) {
                Some(&slot) => {
                    let edge = &mut open[slot];
                    if !edge.matched {
                        if edge.normal.dot(normal) <= threshold_dot {
                            segments.push(positions[edge.a as usize]);
                            segments.push(positions[edge.b as usize]);
                        }
                        edge.matched = true;
                    }
                }
                None => {
                    lookup.insert(key, open.len());
                    open.push(OpenEdge {
                        a: corners[j],
                        b: corners[k],
                        normal,
                        matched: false,
                    });
                }
            }
        }
    }

    for edge in open.iter().filter(|e| !e.matched) {
        segments.push(positions[edge.a as usize]);
        segments.push(positions[edge.b as usize]);
    }

    if skipped > 0 {
        tracing::warn!(skipped, "mesh has triangles with out-of-range indices");
    }
    segments
}
