//! Built-in block font
//!
//! Each glyph is a 5x7 cell bitmap (row 0 is the top). Outlines are traced
//! from the filled cells on the integer grid: outer contours come out
//! counter-clockwise, holes clockwise. No glyph contains two cells touching
//! only at a corner, so every traced contour is a simple polygon.

use glam::IVec2;
use std::collections::BTreeMap;

/// Glyph cell columns
pub const GLYPH_WIDTH: i32 = 5;
/// Glyph cell rows
pub const GLYPH_HEIGHT: i32 = 7;
/// Horizontal distance between glyph origins, in cells
pub const GLYPH_ADVANCE: i32 = 6;

pub type Bitmap = [&'static str; 7];

const BLANK: Bitmap = [".....", ".....", ".....", ".....", ".....", ".....", "....."];

/// Look up the bitmap for a character
///
/// Lowercase letters map to their uppercase forms. Returns `None` for
/// characters outside the font.
pub fn glyph_bitmap(ch: char) -> Option<Bitmap> {
    let bitmap = match ch.to_ascii_uppercase() {
        ' ' => BLANK,
        'A' => [
            "#####",
            "#...#",
            "#...#",
            "#####",
            "#...#",
            "#...#",
            "#...#",
        ],
        'B' => [
            "####.",
            "#..##",
            "#...#",
            "#####",
            "#...#",
            "#..##",
            "####.",
        ],
        'C' => [
            "#####",
            "#....",
            "#....",
            "#....",
            "#....",
            "#....",
            "#####",
        ],
        'D' => [
            "####.",
            "#..##",
            "#...#",
            "#...#",
            "#...#",
            "#..##",
            "####.",
        ],
        'E' => [
            "#####",
            "#....",
            "#....",
            "####.",
            "#....",
            "#....",
            "#####",
        ],
        'F' => [
            "#####",
            "#....",
            "#....",
            "####.",
            "#....",
            "#....",
            "#....",
        ],
        'G' => [
            "#####",
            "#....",
            "#....",
            "#.###",
            "#...#",
            "#...#",
            "#####",
        ],
        'H' => [
            "#...#",
            "#...#",
            "#...#",
            "#####",
            "#...#",
            "#...#",
            "#...#",
        ],
        'I' => [
            "#####",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "#####",
        ],
        'J' => [
            "#####",
            "...#.",
            "...#.",
            "...#.",
            "...#.",
            "#..#.",
            "####.",
        ],
        'K' => [
            "#...#",
            "#..##",
            "#.##.",
            "###..",
            "#.##.",
            "#..##",
            "#...#",
        ],
        'L' => [
            "#....",
            "#....",
            "#....",
            "#....",
            "#....",
            "#....",
            "#####",
        ],
        'M' => [
            "#####",
            "#.#.#",
            "#.#.#",
            "#.#.#",
            "#...#",
            "#...#",
            "#...#",
        ],
        'N' => [
            "##..#",
            "###.#",
            "#.#.#",
            "#.###",
            "#..##",
            "#...#",
            "#...#",
        ],
        'O' => [
            "#####",
            "#...#",
            "#...#",
            "#...#",
            "#...#",
            "#...#",
            "#####",
        ],
        'P' => [
            "#####",
            "#...#",
            "#...#",
            "#####",
            "#....",
            "#....",
            "#....",
        ],
        'Q' => [
            "#####",
            "#...#",
            "#...#",
            "#...#",
            "#..##",
            "#..##",
            "#####",
        ],
        'R' => [
            "#####",
            "#...#",
            "#...#",
            "#####",
            "#.##.",
            "#..##",
            "#...#",
        ],
        'S' => [
            "#####",
            "#....",
            "#....",
            "#####",
            "....#",
            "....#",
            "#####",
        ],
        'T' => [
            "#####",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
        ],
        'U' => [
            "#...#",
            "#...#",
            "#...#",
            "#...#",
            "#...#",
            "#...#",
            "#####",
        ],
        'V' => [
            "#...#",
            "#...#",
            "#...#",
            "##.##",
            ".#.#.",
            ".###.",
            "..#..",
        ],
        'W' => [
            "#...#",
            "#...#",
            "#...#",
            "#.#.#",
            "#.#.#",
            "#.#.#",
            "#####",
        ],
        'X' => [
            "#...#",
            "##.##",
            ".###.",
            "..#..",
            ".###.",
            "##.##",
            "#...#",
        ],
        'Y' => [
            "#...#",
            "##.##",
            ".###.",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
        ],
        'Z' => [
            "#####",
            "....#",
            "...##",
            "..##.",
            ".##..",
            "##...",
            "#####",
        ],
        '0' => [
            "#####",
            "#..##",
            "#...#",
            "#...#",
            "#...#",
            "##..#",
            "#####",
        ],
        '1' => [
            "..#..",
            ".##..",
            "..#..",
            "..#..",
            "..#..",
            "..#..",
            "#####",
        ],
        '2' => [
            "#####",
            "....#",
            "....#",
            "#####",
            "#....",
            "#....",
            "#####",
        ],
        '3' => [
            "#####",
            "....#",
            "....#",
            ".####",
            "....#",
            "....#",
            "#####",
        ],
        '4' => [
            "#...#",
            "#...#",
            "#...#",
            "#####",
            "....#",
            "....#",
            "....#",
        ],
        '5' => [
            "#####",
            "#....",
            "#....",
            "#####",
            "....#",
            "....#",
            "#####",
        ],
        '6' => [
            "#####",
            "#....",
            "#....",
            "#####",
            "#...#",
            "#...#",
            "#####",
        ],
        '7' => [
            "#####",
            "....#",
            "....#",
            "...##",
            "...#.",
            "...#.",
            "...#.",
        ],
        '8' => [
            "#####",
            "#...#",
            "#...#",
            "#####",
            "#...#",
            "#...#",
            "#####",
        ],
        '9' => [
            "#####",
            "#...#",
            "#...#",
            "#####",
            "....#",
            "....#",
            "#####",
        ],
        '+' => [
            ".....",
            "..#..",
            "..#..",
            "#####",
            "..#..",
            "..#..",
            ".....",
        ],
        '#' => [
            ".#.#.",
            "#####",
            ".#.#.",
            ".#.#.",
            "#####",
            ".#.#.",
            ".....",
        ],
        '-' => [
            ".....",
            ".....",
            ".....",
            "#####",
            ".....",
            ".....",
            ".....",
        ],
        '.' => [
            ".....",
            ".....",
            ".....",
            ".....",
            ".....",
            ".##..",
            ".##..",
        ],
        _ => return None,
    };
    Some(bitmap)
}

fn filled(bitmap: &Bitmap, x: i32, y: i32) -> bool {
    if !(0..GLYPH_WIDTH).contains(&x) || !(0..GLYPH_HEIGHT).contains(&y) {
        return false;
    }
    let row = bitmap[(GLYPH_HEIGHT - 1 - y) as usize].as_bytes();
    row[x as usize] == b'#'
}

/// Twice the signed area of a contour (positive = counter-clockwise)
pub fn signed_area2(contour: &[IVec2]) -> i64 {
    (0..contour.len())
        .map(|i| {
            let a = contour[(i + contour.len() - 1) % contour.len()];
            let b = contour[i];
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum()
}

/// Cross product of `(a - o)` and `(b - o)`
#[inline]
pub fn cross(o: IVec2, a: IVec2, b: IVec2) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Trace the outline contours of a glyph bitmap
///
/// Collinear points are removed, so every contour vertex is a corner.
pub fn trace_outline(bitmap: &Bitmap) -> Vec<Vec<IVec2>> {
    // Directed boundary edges, keyed by start point
    let mut edges: BTreeMap<(i32, i32), (i32, i32)> = BTreeMap::new();
    for y in 0..GLYPH_HEIGHT {
        for x in 0..GLYPH_WIDTH {
            if !filled(bitmap, x, y) {
                continue;
            }
            if !filled(bitmap, x, y - 1) {
                edges.insert((x, y), (x + 1, y));
            }
            if !filled(bitmap, x + 1, y) {
                edges.insert((x + 1, y), (x + 1, y + 1));
            }
            if !filled(bitmap, x, y + 1) {
                edges.insert((x + 1, y + 1), (x, y + 1));
            }
            if !filled(bitmap, x - 1, y) {
                edges.insert((x, y + 1), (x, y));
            }
        }
    }

    let mut contours = Vec::new();
    while let Some((start, mut next)) = edges.pop_first() {
        let mut contour = vec![IVec2::new(start.0, start.1)];
        while next != start {
            contour.push(IVec2::new(next.0, next.1));
            match edges.remove(&next) {
                Some(following) => next = following,
                None => break,
            }
        }
        remove_collinear(&mut contour);
        if contour.len() >= 3 {
            contours.push(contour);
        }
    }
    contours
}

fn remove_collinear(contour: &mut Vec<IVec2>) {
    let mut i = 0;
    while i < contour.len() && contour.len() > 3 {
        let n = contour.len();
        let (prev, cur, next) = (contour[(i + n - 1) % n], contour[i], contour[(i + 1) % n]);
        if cross(prev, cur, next) == 0 {
            contour.remove(i);
            i = 0;
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+#-.";

    #[test]
    fn test_every_glyph_is_well_formed() {
        for ch in CHARSET.chars() {
            let bitmap = glyph_bitmap(ch).unwrap();
            for row in bitmap {
                assert_eq!(row.len(), GLYPH_WIDTH as usize, "glyph {ch}");
            }
            // No 2x2 checkerboards: contours must stay simple
            for y in -1..GLYPH_HEIGHT {
                for x in -1..GLYPH_WIDTH {
                    let a = filled(&bitmap, x, y);
                    let b = filled(&bitmap, x + 1, y);
                    let c = filled(&bitmap, x, y + 1);
                    let d = filled(&bitmap, x + 1, y + 1);
                    assert!(!(a == d && b == c && a != b), "glyph {ch} pinches at {x},{y}");
                }
            }
        }
    }

    #[test]
    fn test_outline_area_matches_cell_count() {
        for ch in CHARSET.chars() {
            let bitmap = glyph_bitmap(ch).unwrap();
            let cells = bitmap.iter().map(|r| r.matches('#').count() as i64).sum::<i64>();
            let area2: i64 = trace_outline(&bitmap).iter().map(|c| signed_area2(c)).sum();
            assert_eq!(area2, cells * 2, "glyph {ch}");
        }
    }

    #[test]
    fn test_hole_orientation() {
        let contours = trace_outline(&glyph_bitmap('O').unwrap());
        assert_eq!(contours.len(), 2);
        let areas: Vec<i64> = contours.iter().map(|c| signed_area2(c)).collect();
        assert!(areas.iter().any(|&a| a > 0));
        assert!(areas.iter().any(|&a| a < 0));
        // Outer and hole are both rectangles once collinear points go
        assert!(contours.iter().all(|c| c.len() == 4));
    }

    #[test]
    fn test_lowercase_and_unknown() {
        assert_eq!(glyph_bitmap('r'), glyph_bitmap('R'));
        assert!(glyph_bitmap('@').is_none());
        assert!(trace_outline(&glyph_bitmap(' ').unwrap()).is_empty());
    }
}
