use crate::fits::ImageUnit;

/// `num` values spaced evenly on a log scale from `start` to `end`, both
/// included. `start` and `end` must share a sign and be non-zero.
pub fn geomspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let log_start = start.abs().ln();
            let log_end = end.abs().ln();
            let step = (log_end - log_start) / (num - 1) as f64;
            let sign = start.signum();
            let mut levels: Vec<f64> = (0..num)
                .map(|i| sign * (log_start + step * i as f64).exp())
                .collect();
            // Pin the endpoints against exp/ln rounding.
            levels[0] = start;
            levels[num - 1] = end;
            levels
        }
    }
}

/// Symmetric contour set: `noise × [-reversed(geomspace), geomspace]`.
pub fn contour_levels(start: f64, end: f64, num: usize, noise: f64) -> Vec<f64> {
    let positive = geomspace(start, end, num);
    positive
        .iter()
        .rev()
        .map(|v| -v * noise)
        .chain(positive.iter().map(|v| v * noise))
        .collect()
}

/// A contour line piece between two points in pixel coordinates.
pub type Segment = [(f64, f64); 2];

/// Marching squares over the pixel grid. Cells touching a non-finite pixel
/// are skipped. Saddle cells are resolved with the cell-centre average.
pub fn contour_segments(image: &ImageUnit, level: f64) -> Vec<Segment> {
    let (w, h) = (image.width, image.height);
    let mut segments = Vec::new();
    if w < 2 || h < 2 {
        return segments;
    }
    let at = |x: usize, y: usize| image.data[y * w + x];

    for y in 0..h - 1 {
        for x in 0..w - 1 {
            // Corners counter-clockwise from bottom-left.
            let v = [at(x, y), at(x + 1, y), at(x + 1, y + 1), at(x, y + 1)];
            if v.iter().any(|c| !c.is_finite()) {
                continue;
            }
            let p = [
                (x as f64, y as f64),
                (x as f64 + 1.0, y as f64),
                (x as f64 + 1.0, y as f64 + 1.0),
                (x as f64, y as f64 + 1.0),
            ];
            let case = v
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, c)| acc | (u8::from(*c >= level) << i));

            // Crossing on edge i (between corner i and i+1).
            let edge = |i: usize| {
                let j = (i + 1) % 4;
                let t = (level - v[i]) / (v[j] - v[i]);
                (p[i].0 + t * (p[j].0 - p[i].0), p[i].1 + t * (p[j].1 - p[i].1))
            };

            let pairs: &[(usize, usize)] = match case {
                0 | 15 => &[],
                1 | 14 => &[(3, 0)],
                2 | 13 => &[(0, 1)],
                3 | 12 => &[(3, 1)],
                4 | 11 => &[(1, 2)],
                6 | 9 => &[(0, 2)],
                7 | 8 => &[(2, 3)],
                5 | 10 => {
                    let centre_high = v.iter().sum::<f64>() / 4.0 >= level;
                    match (case == 5, centre_high) {
                        (true, true) | (false, false) => &[(3, 2), (0, 1)],
                        _ => &[(3, 0), (1, 2)],
                    }
                }
                _ => &[],
            };
            segments.extend(pairs.iter().map(|&(a, b)| [edge(a), edge(b)]));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::wcs::tests::sin_header;
    use approx::assert_relative_eq;

    #[test]
    fn geomspace_spans_endpoints_monotonically() {
        let g = geomspace(5.0, 405.0, 7);
        assert_eq!(g.len(), 7);
        assert_eq!(g[0], 5.0);
        assert_eq!(g[6], 405.0);
        assert!(g.windows(2).all(|w| w[1] > w[0]));
        // Constant ratio: 81^(1/6) = 3^(2/3)
        assert_relative_eq!(g[1] / g[0], 3f64.powf(2.0 / 3.0), epsilon = 1e-9);
        assert!(geomspace(1.0, 2.0, 0).is_empty());
        assert_eq!(geomspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn contour_levels_are_symmetric_and_scaled() {
        let noise = 0.02;
        let levels = contour_levels(5.0, 405.0, 7, noise);
        assert_eq!(levels.len(), 14);
        for i in 0..7 {
            assert_relative_eq!(levels[i], -levels[13 - i], epsilon = 1e-15);
        }
        assert_relative_eq!(levels[7], 5.0 * noise);
        assert_relative_eq!(levels[13], 405.0 * noise);
        assert!(levels.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn marching_squares_traces_a_closed_ring() {
        // Radial cone peaking at the centre.
        let n = 21;
        let data: Vec<f64> = (0..n * n)
            .map(|i| {
                let (x, y) = ((i % n) as f64 - 10.0, (i / n) as f64 - 10.0);
                10.0 - x.hypot(y)
            })
            .collect();
        let img = ImageUnit::from_parts(vec![n, n], data, sin_header()).unwrap();

        let segs = contour_segments(&img, 5.0);
        assert!(!segs.is_empty());
        for [a, b] in &segs {
            for (x, y) in [a, b] {
                let r = (x - 10.0).hypot(y - 10.0);
                assert!((r - 5.0).abs() < 0.3, "point at radius {r}");
            }
        }
        assert!(contour_segments(&img, 50.0).is_empty());
    }
}
