use crate::braille::BrailleCanvas;

/// Bresenham line between two pixel positions. Segments lying entirely
/// outside the canvas are skipped.
pub fn draw_line(canvas: &mut BrailleCanvas, from: (i32, i32), to: (i32, i32)) {
    let (width, height) = canvas.pixel_size();
    if !segment_might_be_visible(from, to, width as i32, height as i32) {
        return;
    }

    let (x1, y1) = to;
    let dx = (x1 - from.0).abs();
    let dy = -(y1 - from.1).abs();
    let sx = if from.0 < x1 { 1 } else { -1 };
    let sy = if from.1 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = from;

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a polyline, breaking it wherever a vertex is `None` (culled).
pub fn draw_polyline(canvas: &mut BrailleCanvas, points: impl IntoIterator<Item = Option<(i32, i32)>>) {
    let mut prev: Option<(i32, i32)> = None;
    for point in points {
        if let (Some(a), Some(b)) = (prev, point) {
            draw_line(canvas, a, b);
        }
        prev = point;
    }
}

/// Filled dot, used for label anchors
pub fn draw_dot(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Rough bounding box check against the canvas
#[inline]
fn segment_might_be_visible(a: (i32, i32), b: (i32, i32), width: i32, height: i32) -> bool {
    a.0.max(b.0) >= 0 && a.0.min(b.0) < width && a.1.max(b.1) >= 0 && a.1.min(b.1) < height
}
