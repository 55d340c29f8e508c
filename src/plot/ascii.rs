//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual comparison of the current and forecast curves
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - current curve: `-` line, observed points `o`
//! - forecast curve: `=` line, forecast points `x`

use crate::io::curve::{CurveFile, CurveSection};

const CURRENT_LINE: char = '-';
const CURRENT_POINT: char = 'o';
const FORECAST_LINE: char = '=';
const FORECAST_POINT: char = 'x';

/// Render the curves of a curve file on one grid.
pub fn render_curve_comparison(curve: &CurveFile, width: usize, height: usize) -> String {
    let mut sections: Vec<(&CurveSection, char, char)> = Vec::with_capacity(2);
    if let Some(current) = &curve.current {
        sections.push((current, CURRENT_LINE, CURRENT_POINT));
    }
    sections.push((&curve.forecast, FORECAST_LINE, FORECAST_POINT));
    render_sections(&sections, width, height)
}

fn render_sections(sections: &[(&CurveSection, char, char)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (t_min, t_max) = tau_range(sections).unwrap_or((0.25, 30.0));
    let (y_min, y_max) = y_range(sections).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so points overlay them.
    for (s, line, _) in sections {
        let pts: Vec<(f64, f64)> = s
            .grid
            .maturity_years
            .iter()
            .copied()
            .zip(s.grid.y.iter().copied())
            .collect();
        draw_curve(&mut grid, &pts, (t_min, t_max), (y_min, y_max), *line);
    }
    for (s, _, point) in sections {
        for (&t, &y) in s.maturities.iter().zip(&s.yields) {
            if !(t.is_finite() && y.is_finite()) {
                continue;
            }
            let x = map_x(t, t_min, t_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][x] = *point;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: maturity=[{t_min:.3}, {t_max:.3}] years | y=[{y_min:.2}, {y_max:.2}]%\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out.push_str(&legend(sections));
    out
}

fn legend(sections: &[(&CurveSection, char, char)]) -> String {
    let parts: Vec<String> = sections
        .iter()
        .map(|(_, line, point)| {
            let name = if *line == CURRENT_LINE { "current" } else { "forecast" };
            format!("{line}{point} {name}")
        })
        .collect();
    format!("{}\n", parts.join("  "))
}

fn tau_range(sections: &[(&CurveSection, char, char)]) -> Option<(f64, f64)> {
    let ts = sections
        .iter()
        .flat_map(|(s, _, _)| s.grid.maturity_years.iter().chain(&s.maturities));
    finite_range(ts.copied())
}

fn y_range(sections: &[(&CurveSection, char, char)]) -> Option<(f64, f64)> {
    let ys = sections.iter().flat_map(|(s, _, _)| s.grid.y.iter().chain(&s.yields));
    finite_range(ys.copied())
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo.is_finite() && hi.is_finite() && hi > lo).then_some((lo, hi))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (largest y).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t: (f64, f64), y: (f64, f64), ch: char) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);
    if width == 0 {
        return;
    }

    let mut prev = None;
    for &(tt, yy) in curve {
        if !(tt.is_finite() && yy.is_finite()) {
            prev = None;
            continue;
        }
        let x = map_x(tt, t.0, t.1, width);
        let row = map_y(yy, y.0, y.1, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, (x0, y0), (x, row), ch),
            None => {
                if grid[row][x] == ' ' {
                    grid[row][x] = ch;
                }
            }
        }
        prev = Some((x, row));
    }
}

/// Integer line drawing (Bresenham). Never overwrites a filled cell.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
        {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
