use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Fill projected rings with the even-odd rule (holes stay empty).
/// Each scanline samples at the pixel centre.
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<(f64, f64)>]) {
    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    if min_y > max_y {
        return;
    }

    let first_row = (min_y.floor() as i32).max(0);
    let last_row = (max_y.ceil() as i32).min(canvas.pixel_height() as i32 - 1);
    let mut crossings: Vec<f64> = Vec::new();

    for row in first_row..=last_row {
        let scan_y = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            if ring.len() < 2 {
                continue;
            }
            let mut prev = ring[ring.len() - 1];
            for &point in ring {
                let (x0, y0) = prev;
                let (x1, y1) = point;
                if (y0 > scan_y) != (y1 > scan_y) {
                    crossings.push(x0 + (scan_y - y0) * (x1 - x0) / (y1 - y0));
                }
                prev = point;
            }
        }

        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let start = pair[0].round() as i32;
            let end = pair[1].round() as i32 - 1;
            if end >= start {
                canvas.fill_span(row, start, end);
            }
        }
    }
}

/// Outline a projected ring. Segments wider than `max_jump` pixels are
/// skipped so rings crossing the antimeridian don't smear across the map.
pub fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], max_jump: i32) {
    for pair in ring.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if (x1 - x0).abs() + (y1 - y0).abs() < max_jump {
            draw_line(canvas, x0, y0, x1, y1);
        }
    }
}
