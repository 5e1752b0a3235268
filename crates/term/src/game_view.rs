//! GameView: maps a [`ViewModel`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). Playfield row 0 is the bottom row, so board
//! rows are flipped on the way to the screen. Only the visible rows are drawn.

use crate::core::{ActionRecord, Falling, Tetromino};
use crate::engine::GameRecord;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{GameMode, PieceKind};
use crate::view_model::ViewModel;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

const BOARD_BG: Rgb = Rgb::new(30, 30, 40);
const PANEL_BG: Rgb = Rgb::new(0, 0, 0);

/// Where a board sits on screen
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
}

/// A lightweight terminal renderer for the game.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 compensates for the usual glyph aspect ratio.
        Self::new(2, 1)
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
        }
    }

    /// Render into an existing framebuffer, resizing it to the viewport.
    pub fn render_into(&self, view: &ViewModel, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let cols = view.playfield.cols() as u16;
        let rows = view.rows as u16;
        let w = cols * self.cell_w + 2;
        let h = rows * self.cell_h + 2;
        let frame = Frame {
            x: viewport.width.saturating_sub(w) / 2,
            y: viewport.height.saturating_sub(h) / 2,
            w,
            h,
        };

        let bg = CellStyle::new(Rgb::new(90, 90, 100), BOARD_BG).dim();
        fb.fill_rect(frame.x + 1, frame.y + 1, w - 2, h - 2, ' ', bg);
        self.draw_border(fb, frame, CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG));

        for y in 0..view.rows {
            for x in 0..view.playfield.cols() {
                match view.playfield.get(x as i32, y as i32).flatten() {
                    Some(kind) => self.draw_block(fb, frame, view, x as i32, y as i32, kind, false),
                    None => self.fill_cell(fb, frame, view, x as i32, y as i32, '·', bg),
                }
            }
        }

        if let Some(falling) = view.falling {
            if !view.stopped {
                self.draw_ghost(fb, frame, view, &falling);
            }
            for p in falling.piece.cells_at(falling.point) {
                self.draw_block(fb, frame, view, p.x as i32, p.y as i32, falling.piece.kind, true);
            }
        }

        self.draw_side_panel(fb, view, viewport, frame);

        if view.stopped {
            let text = match view.record {
                Some(record) => record_text(record),
                None => "GAME OVER".to_string(),
            };
            self.draw_overlay_text(fb, frame, 0, &text);
            if view.record.is_some() {
                self.draw_overlay_text(fb, frame, 2, "ENTER restart");
                self.draw_overlay_text(fb, frame, 3, "Q quit");
            }
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, view: &ViewModel, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(view, viewport, &mut fb);
        fb
    }

    fn draw_border(&self, fb: &mut FrameBuffer, frame: Frame, style: CellStyle) {
        let Frame { x, y, w, h } = frame;
        if w < 2 || h < 2 {
            return;
        }

        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
    }

    fn draw_ghost(&self, fb: &mut FrameBuffer, frame: Frame, view: &ViewModel, falling: &Falling) {
        if falling.ghost == falling.point {
            return;
        }
        let style = CellStyle::new(piece_color(falling.piece.kind), BOARD_BG).dim();
        for p in falling.piece.cells_at(falling.ghost) {
            self.fill_cell(fb, frame, view, p.x as i32, p.y as i32, '░', style);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_block(
        &self,
        fb: &mut FrameBuffer,
        frame: Frame,
        view: &ViewModel,
        x: i32,
        y: i32,
        kind: PieceKind,
        bold: bool,
    ) {
        let style = CellStyle {
            bold,
            ..CellStyle::new(piece_color(kind), BOARD_BG)
        };
        self.fill_cell(fb, frame, view, x, y, '█', style);
    }

    /// Paint board cell `(x, y)`; cells outside the visible rows are skipped.
    #[allow(clippy::too_many_arguments)]
    fn fill_cell(
        &self,
        fb: &mut FrameBuffer,
        frame: Frame,
        view: &ViewModel,
        x: i32,
        y: i32,
        ch: char,
        style: CellStyle,
    ) {
        if x < 0 || y < 0 || x >= view.playfield.cols() as i32 || y >= view.rows as i32 {
            return;
        }
        let screen_row = (view.rows as i32 - 1 - y) as u16;
        let px = frame.x + 1 + x as u16 * self.cell_w;
        let py = frame.y + 1 + screen_row * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_side_panel(&self, fb: &mut FrameBuffer, view: &ViewModel, viewport: Viewport, frame: Frame) {
        let panel_x = frame.x.saturating_add(frame.w).saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return;
        }

        let label = CellStyle::new(Rgb::new(220, 220, 220), PANEL_BG).bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG);

        let mut y = frame.y;
        fb.put_str(panel_x, y, mode_title(view.mode), label);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "SCORE", label);
        fb.put_u64(panel_x, y + 1, view.figures.score, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "LEVEL", label);
        fb.put_u64(panel_x, y + 1, view.figures.level as u64, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "LINES", label);
        fb.put_u64(panel_x, y + 1, view.figures.lines as u64, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "TIME", label);
        put_clock(fb, panel_x, y + 1, view.seconds, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "HOLD", label);
        match view.hold {
            Some(piece) => self.draw_mini(fb, panel_x, y + 1, piece),
            None => fb.put_str(panel_x, y + 1, "-", value),
        }
        y = y.saturating_add(4);

        fb.put_str(panel_x, y, "NEXT", label);
        y = y.saturating_add(1);
        for piece in view.preview.iter().take(5) {
            if y.saturating_add(2) > viewport.height {
                break;
            }
            self.draw_mini(fb, panel_x, y, *piece);
            y = y.saturating_add(3);
        }

        if let Some(text) = action_text(&view.action) {
            fb.put_str(panel_x, y, &text, label);
        }
    }

    /// Two-row sketch of a piece in spawn orientation
    fn draw_mini(&self, fb: &mut FrameBuffer, x: u16, y: u16, piece: Tetromino) {
        let style = CellStyle::new(piece_color(piece.kind), PANEL_BG);
        for p in piece.reset().geometry() {
            let px = x as i32 + (p.x as i32 + 1) * 2;
            let py = y as i32 + 1 - p.y as i32;
            if px >= 0 && py >= 0 {
                fb.put_str(px as u16, py as u16, "██", style);
            }
        }
    }

    fn draw_overlay_text(&self, fb: &mut FrameBuffer, frame: Frame, line: u16, text: &str) {
        let y = frame.y.saturating_add(frame.h / 2).saturating_add(line);
        let text_w = text.chars().count() as u16;
        let x = frame.x.saturating_add(frame.w.saturating_sub(text_w) / 2);
        let style = CellStyle::new(Rgb::new(255, 255, 255), PANEL_BG).bold();
        fb.put_str(x, y, text, style);
    }
}

fn piece_color(kind: PieceKind) -> Rgb {
    match kind {
        PieceKind::I => Rgb::new(80, 220, 220),
        PieceKind::O => Rgb::new(240, 220, 80),
        PieceKind::T => Rgb::new(200, 120, 220),
        PieceKind::S => Rgb::new(100, 220, 120),
        PieceKind::Z => Rgb::new(220, 80, 80),
        PieceKind::J => Rgb::new(80, 120, 220),
        PieceKind::L => Rgb::new(255, 165, 0),
    }
}

/// `m:ss` without allocating
fn put_clock(fb: &mut FrameBuffer, x: u16, y: u16, seconds: u64, style: CellStyle) {
    let minutes = seconds / 60;
    let mut width = 1;
    let mut rest = minutes / 10;
    while rest > 0 {
        width += 1;
        rest /= 10;
    }
    let secs = seconds % 60;
    fb.put_u64(x, y, minutes, style);
    let x = x.saturating_add(width);
    fb.put_char(x, y, ':', style);
    fb.put_char(x.saturating_add(1), y, (b'0' + (secs / 10) as u8) as char, style);
    fb.put_char(x.saturating_add(2), y, (b'0' + (secs % 10) as u8) as char, style);
}

/// `m:ss`
pub fn clock_text(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Final result as shown on the game-over overlay
pub fn record_text(record: GameRecord) -> String {
    match record {
        GameRecord::Score(score) => format!("SCORE {score}"),
        GameRecord::SprintTime(Some(ms)) => {
            format!("TIME {}.{:03}", clock_text(ms / 1000), ms % 1000)
        }
        GameRecord::SprintTime(None) => "GAME OVER".to_string(),
    }
}

/// Name of the last scoring action, if it is worth showing
pub fn action_text(action: &ActionRecord) -> Option<String> {
    const NAMES: [&str; 5] = ["", "SINGLE", "DOUBLE", "TRIPLE", "TETRIS"];
    let lines = NAMES.get(action.line_clear as usize).copied().unwrap_or("");
    let mut text = match (action.tspin, lines.is_empty()) {
        (true, true) => "T-SPIN".to_string(),
        (true, false) => format!("T-SPIN {lines}"),
        (false, false) => lines.to_string(),
        (false, true) => return None,
    };
    if action.b2b {
        text.insert_str(0, "B2B ");
    }
    if let Some(combo) = action.combo.filter(|&c| c > 0) {
        text.push_str(&format!(" x{combo}"));
    }
    Some(text)
}

/// Mode name as shown in the panel
pub fn mode_title(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Marathon => "MARATHON",
        GameMode::Ultra => "ULTRA",
        GameMode::Sprint => "SPRINT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Playfield;
    use crate::types::Point;

    fn view_with_piece() -> ViewModel {
        let piece = Tetromino::spawn(PieceKind::T);
        ViewModel {
            playfield: Playfield::from_rows_top_down(10, 22, &["IIII......"]),
            falling: Some(Falling {
                piece,
                point: Point::new(4, 20),
                ghost: Point::new(4, 1),
            }),
            ..ViewModel::default()
        }
    }

    #[test]
    fn test_board_is_flipped_onto_screen() {
        let view = view_with_piece();
        let fb = GameView::default().render(&view, Viewport::new(60, 30));
        // 22 rows + border in 30 rows -> frame top at 3, board rows 4..=25.
        let bottom = fb.row_text(25);
        assert!(bottom.contains("████████··"), "{bottom:?}");
        let top = fb.row_text(4);
        assert!(top.contains("··██······"), "{top:?}");
        let ghost = fb.row_text(23);
        assert!(ghost.contains('░'));
    }

    #[test]
    fn test_panel_and_overlay() {
        let mut view = view_with_piece();
        view.mode = GameMode::Sprint;
        view.stopped = true;
        view.record = Some(GameRecord::SprintTime(Some(83_250)));
        let fb = GameView::default().render(&view, Viewport::new(60, 30));
        let text: String = (0..30).map(|y| fb.row_text(y) + "\n").collect();
        assert!(text.contains("SPRINT"));
        assert!(text.contains("TIME 1:23.250"));
        assert!(text.contains("ENTER restart"));
        assert!(!text.contains('░'));
    }

    #[test]
    fn test_tiny_viewport_does_not_panic() {
        let fb = GameView::default().render(&view_with_piece(), Viewport::new(5, 3));
        assert_eq!((fb.width(), fb.height()), (5, 3));
    }

    #[test]
    fn test_action_text() {
        let mut action = ActionRecord {
            line_clear: 2,
            tspin: true,
            ..ActionRecord::default()
        };
        assert_eq!(action_text(&action).as_deref(), Some("T-SPIN DOUBLE"));
        action.b2b = true;
        action.combo = Some(2);
        assert_eq!(action_text(&action).as_deref(), Some("B2B T-SPIN DOUBLE x2"));
        assert_eq!(action_text(&ActionRecord::default()), None);
    }

    #[test]
    fn test_clock_and_record_text() {
        assert_eq!(clock_text(0), "0:00");
        assert_eq!(clock_text(179), "2:59");
        assert_eq!(record_text(GameRecord::Score(1200)), "SCORE 1200");
        assert_eq!(record_text(GameRecord::SprintTime(None)), "GAME OVER");
        assert_eq!(mode_title(GameMode::Ultra), "ULTRA");
    }
}
