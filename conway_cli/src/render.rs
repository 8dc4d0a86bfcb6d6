// render.rs - Text rendering and population stats for the console

use std::fmt;

use conway::Cells;

const LIVE: char = '#';
const DEAD: char = '.';

/// One line per row, followed by a separator.
pub fn render(cells: &Cells) -> String {
    let width = cells.first().map_or(0, Vec::len);
    let mut out = String::with_capacity((width + 1) * (cells.len() + 1));
    for row in cells {
        out.extend(row.iter().map(|&alive| if alive { LIVE } else { DEAD }));
        out.push('\n');
    }
    out.push_str(&"-".repeat(width.max(1)));
    out.push('\n');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub live:  usize,
    pub total: usize,
}

impl Population {
    pub fn of(cells: &Cells) -> Self {
        let live = cells.iter().map(|row| row.iter().filter(|&&c| c).count()).sum();
        let total = cells.iter().map(Vec::len).sum();
        Self { live, total }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.live as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Live cells: {}  Dead cells: {}  Population: {:.1}%",
            self.live,
            self.total - self.live,
            self.percent()
        )
    }
}
