//! Polygon-with-holes triangulation on the integer glyph grid
//!
//! Each outer contour absorbs the holes it contains through bridge edges,
//! then the merged polygon is ear-clipped. All predicates use exact integer
//! arithmetic.

use glam::IVec2;

use super::glyphs::{cross, signed_area2};

fn on_segment(p: IVec2, q: IVec2, w: IVec2) -> bool {
    p.x.min(q.x) <= w.x && w.x <= p.x.max(q.x) && p.y.min(q.y) <= w.y && w.y <= p.y.max(q.y)
}

/// Segments `p1-p2` and `q1-q2` cross or touch
fn segments_intersect(p1: IVec2, p2: IVec2, q1: IVec2, q2: IVec2) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    if d1 != 0 && d2 != 0 && d3 != 0 && d4 != 0 && (d1 > 0) != (d2 > 0) && (d3 > 0) != (d4 > 0) {
        return true;
    }
    (d1 == 0 && on_segment(q1, q2, p1))
        || (d2 == 0 && on_segment(q1, q2, p2))
        || (d3 == 0 && on_segment(p1, p2, q1))
        || (d4 == 0 && on_segment(p1, p2, q2))
}

fn point_in_contour(points: &[IVec2], contour: &[u32], pt: IVec2) -> bool {
    let mut inside = false;
    for i in 0..contour.len() {
        let a = points[contour[(i + contour.len() - 1) % contour.len()] as usize];
        let b = points[contour[i] as usize];
        if (a.y > pt.y) != (b.y > pt.y) {
            let x = a.x as f64 + (pt.y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64;
            if (pt.x as f64) < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Splice each hole into `outer` through a bridge edge
///
/// Holes are processed from the rightmost inwards. Each hole's rightmost
/// vertex is joined to the nearest outer vertex at or to its right whose
/// connecting segment crosses no contour edge.
fn bridge_holes(points: &[IVec2], outer: &[u32], holes: &[&[u32]]) -> Result<Vec<u32>, String> {
    let mut polygon = outer.to_vec();
    let mut holes: Vec<&[u32]> = holes.to_vec();
    let max_x = |hole: &[u32]| hole.iter().map(|&i| points[i as usize].x).max().unwrap_or(0);
    holes.sort_by_key(|hole| std::cmp::Reverse(max_x(hole)));

    for (hole_idx, hole) in holes.iter().enumerate() {
        // Rightmost vertex, first one on ties
        let mut start = 0;
        for (k, &v) in hole.iter().enumerate() {
            if points[v as usize].x > points[hole[start] as usize].x {
                start = k;
            }
        }
        let m = hole[start];
        let pm = points[m as usize];

        let mut obstacles: Vec<(u32, u32)> = Vec::new();
        for contour in std::iter::once(polygon.as_slice()).chain(holes[hole_idx..].iter().copied()) {
            for i in 0..contour.len() {
                obstacles.push((contour[(i + contour.len() - 1) % contour.len()], contour[i]));
            }
        }

        let mut best: Option<(i64, usize)> = None;
        for (k, &v) in polygon.iter().enumerate() {
            let pv = points[v as usize];
            if pv.x < pm.x {
                continue;
            }
            let blocked = obstacles.iter().any(|&(a, b)| {
                let shares_end = [a, b].iter().any(|e| *e == v || *e == m);
                if shares_end {
                    // The other endpoint must not lie along the bridge
                    [a, b].iter().filter(|&&e| e != v && e != m).any(|&e| {
                        let pe = points[e as usize];
                        cross(pm, pv, pe) == 0 && on_segment(pm, pv, pe)
                    })
                } else {
                    segments_intersect(pm, pv, points[a as usize], points[b as usize])
                }
            });
            if blocked {
                continue;
            }
            let d = pm - pv;
            let dist = d.x as i64 * d.x as i64 + d.y as i64 * d.y as i64;
            if best.is_none_or(|(best_dist, _)| dist < best_dist) {
                best = Some((dist, k));
            }
        }

        let Some((_, k)) = best else {
            return Err("no bridge from hole to outer contour".into());
        };
        let mut merged = Vec::with_capacity(polygon.len() + hole.len() + 2);
        merged.extend_from_slice(&polygon[..=k]);
        merged.extend_from_slice(&hole[start..]);
        merged.extend_from_slice(&hole[..start]);
        merged.push(m);
        merged.extend_from_slice(&polygon[k..]);
        polygon = merged;
    }
    Ok(polygon)
}

/// Ear-clip a counter-clockwise polygon (which may repeat bridge vertices)
fn ear_clip(points: &[IVec2], polygon: Vec<u32>) -> Result<Vec<[u32; 3]>, String> {
    let mut polygon = polygon;
    let mut triangles = Vec::with_capacity(polygon.len().saturating_sub(2));

    while polygon.len() > 3 {
        let n = polygon.len();
        let ear = (0..n).find(|&i| {
            let (a, b, c) = (polygon[(i + n - 1) % n], polygon[i], polygon[(i + 1) % n]);
            let (pa, pb, pc) = (points[a as usize], points[b as usize], points[c as usize]);
            if cross(pa, pb, pc) <= 0 {
                return false;
            }
            // Points on the triangle border block the ear as well
            !polygon.iter().any(|&v| {
                if v == a || v == b || v == c {
                    return false;
                }
                let p = points[v as usize];
                cross(pa, pb, p) >= 0 && cross(pb, pc, p) >= 0 && cross(pc, pa, p) >= 0
            })
        });
        let Some(i) = ear else {
            return Err(format!("no ear found with {n} vertices left"));
        };
        triangles.push([polygon[(i + n - 1) % n], polygon[i], polygon[(i + 1) % n]]);
        polygon.remove(i);
    }

    let (pa, pb, pc) = (
        points[polygon[0] as usize],
        points[polygon[1] as usize],
        points[polygon[2] as usize],
    );
    if cross(pa, pb, pc) <= 0 {
        return Err("final triangle is degenerate".into());
    }
    triangles.push([polygon[0], polygon[1], polygon[2]]);
    Ok(triangles)
}

/// Triangulate a set of traced contours
///
/// `points` holds every contour point; `contours` index into it. Outer
/// contours are counter-clockwise and holes clockwise. Each hole is assigned
/// to the smallest outer contour containing it.
pub fn triangulate(points: &[IVec2], contours: &[Vec<u32>]) -> Result<Vec<[u32; 3]>, String> {
    let area = |c: &[u32]| {
        let pts: Vec<IVec2> = c.iter().map(|&i| points[i as usize]).collect();
        signed_area2(&pts)
    };
    let (outers, holes): (Vec<&Vec<u32>>, Vec<&Vec<u32>>) =
        contours.iter().partition(|c| area(c) > 0);

    let mut owned: Vec<Vec<&[u32]>> = vec![Vec::new(); outers.len()];
    for hole in &holes {
        let probe = points[hole[0] as usize];
        let owner = outers
            .iter()
            .enumerate()
            .filter(|(_, outer)| point_in_contour(points, outer, probe))
            .min_by_key(|(_, outer)| area(outer))
            .map(|(idx, _)| idx)
            .ok_or_else(|| "hole outside every outer contour".to_string())?;
        owned[owner].push(hole.as_slice());
    }

    let mut triangles = Vec::new();
    for (outer, holes) in outers.iter().zip(&owned) {
        let polygon = bridge_holes(points, outer, holes)?;
        triangles.extend(ear_clip(points, polygon)?);
    }
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::text::glyphs::{glyph_bitmap, trace_outline};

    fn glyph_triangles(ch: char) -> (Vec<IVec2>, Vec<[u32; 3]>) {
        let contours = trace_outline(&glyph_bitmap(ch).unwrap());
        let mut points = Vec::new();
        let mut ids = Vec::new();
        for contour in contours {
            let start = points.len() as u32;
            ids.push((start..start + contour.len() as u32).collect::<Vec<_>>());
            points.extend(contour);
        }
        let triangles = triangulate(&points, &ids).unwrap();
        (points, triangles)
    }

    #[test]
    fn test_triangulated_area_matches_cells() {
        for ch in "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+#-.".chars() {
            let (points, triangles) = glyph_triangles(ch);
            let bitmap = glyph_bitmap(ch).unwrap();
            let cells = bitmap.iter().map(|r| r.matches('#').count() as i64).sum::<i64>();
            let area2: i64 = triangles
                .iter()
                .map(|t| cross(points[t[0] as usize], points[t[1] as usize], points[t[2] as usize]))
                .sum();
            assert_eq!(area2, cells * 2, "glyph {ch}");
            for t in &triangles {
                let c = cross(points[t[0] as usize], points[t[1] as usize], points[t[2] as usize]);
                assert!(c > 0, "glyph {ch} has a degenerate or flipped triangle");
            }
        }
    }

    #[test]
    fn test_square_with_hole() {
        let points = vec![
            IVec2::new(0, 0),
            IVec2::new(3, 0),
            IVec2::new(3, 3),
            IVec2::new(0, 3),
            // clockwise hole
            IVec2::new(1, 1),
            IVec2::new(1, 2),
            IVec2::new(2, 2),
            IVec2::new(2, 1),
        ];
        let contours = vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]];
        let triangles = triangulate(&points, &contours).unwrap();
        // 4 + 4 vertices with one hole: n + 2h - 2 triangles
        assert_eq!(triangles.len(), 8);
    }
}
