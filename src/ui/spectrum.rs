//! Spectrum bars widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::{Block, Widget},
};

use crate::visualizer::{BACKGROUND, gradient_color, layout};

const EIGHTHS: [&str; 8] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇"];
const FULL: &str = "█";

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

pub struct Spectrum<'a> {
    frame: &'a [u8],
    block: Option<Block<'a>>,
}

impl<'a> Spectrum<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { frame, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for Spectrum<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let background = rgb(BACKGROUND);
        for y in inner.top()..inner.bottom() {
            for x in inner.left()..inner.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(" ").set_bg(background);
                }
            }
        }

        for bar in layout(self.frame, inner.width, inner.height) {
            let full = bar.height.floor() as u16;
            let eighths = ((bar.height - full as f32) * 8.0).round() as usize;
            let (rows, partial) = if eighths >= 8 {
                (full + 1, 0)
            } else {
                (full, eighths)
            };

            let mut paint = |row: u16, symbol: &str| {
                // Cell centre, measured from the bar's top (0) to its base (1).
                let t = 1.0 - (row as f32 + 0.5) / bar.height.max(f32::EPSILON);
                let color = rgb(gradient_color(t));
                let y = inner.bottom() - 1 - row;
                for x in inner.left() + bar.x..inner.left() + bar.x + bar.width {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_symbol(symbol).set_fg(color).set_bg(background);
                    }
                }
            };

            for row in 0..rows.min(inner.height) {
                paint(row, FULL);
            }
            if partial > 0 && rows < inner.height {
                paint(rows, EIGHTHS[partial]);
            }
        }
    }
}
