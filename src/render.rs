use crate::config::{RENDER_MAX_HEIGHT, RENDER_MAX_WIDTH};
use crate::guillotine::SheetLayout;

/// Draws a sheet as scaled ASCII boxes. Each piece is labelled with its
/// requested size; rotated pieces get an `R` suffix.
pub fn render_sheet(sheet: &SheetLayout) -> String {
    let scale = f64::min(
        RENDER_MAX_WIDTH / sheet.width,
        RENDER_MAX_HEIGHT / sheet.height,
    );
    let grid_w = (sheet.width * scale).round() as usize;
    let grid_h = (sheet.height * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    // Draw sheet border first
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in &sheet.placements {
        let footprint = p.footprint();
        let sx = (p.x * scale).round() as usize;
        let sy = (p.y * scale).round() as usize;
        let sw = (footprint.width * scale).round() as usize;
        let sh = (footprint.height * scale).round() as usize;

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label = if p.rotated {
            format!("{}x{}R", p.width, p.height)
        } else {
            format!("{}x{}", p.width, p.height)
        };
        let label_chars: Vec<char> = label.chars().collect();

        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let start_x = cx.saturating_sub(label_chars.len() / 2);

            for (i, &ch) in label_chars.iter().enumerate() {
                let x = start_x + i;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn edge(current: char, crossing: char, own: char) -> char {
    if current == crossing || current == '+' {
        '+'
    } else {
        own
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let Some(cols) = grid.first().map(Vec::len) else {
        return;
    };

    for i in (x..=x + w).filter(|&i| i < cols) {
        for row in [y, y + h].into_iter().filter(|&r| r < rows) {
            grid[row][i] = edge(grid[row][i], '|', '-');
        }
    }

    for j in (y..=y + h).filter(|&j| j < rows) {
        for col in [x, x + w].into_iter().filter(|&c| c < cols) {
            grid[j][col] = edge(grid[j][col], '-', '|');
        }
    }

    for cx in [x, x + w] {
        for cy in [y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}
