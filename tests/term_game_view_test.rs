use srs_tetris::core::{Figures, Playfield, Tetromino};
use srs_tetris::engine::{Rules, Simulator};
use srs_tetris::term::{GameView, TermPresenter, ViewModel, Viewport};
use srs_tetris::types::{GameMode, PieceKind};

fn screen_text(fb: &srs_tetris::term::FrameBuffer) -> String {
    (0..fb.height()).map(|y| fb.row_text(y) + "\n").collect()
}

#[test]
fn term_view_renders_border_corners() {
    let view = ViewModel::default();

    // With cell_w=2 and cell_h=1: 10x22 cells => 20x22, plus border => 22x24
    let fb = GameView::default().render(&view, Viewport::new(22, 24));

    assert_eq!(fb.get(0, 0).unwrap().ch, '┌');
    assert_eq!(fb.get(21, 0).unwrap().ch, '┐');
    assert_eq!(fb.get(0, 23).unwrap().ch, '└');
    assert_eq!(fb.get(21, 23).unwrap().ch, '┘');
}

#[test]
fn term_view_renders_locked_cell_as_two_chars_wide() {
    let view = ViewModel {
        playfield: Playfield::from_rows_top_down(10, 22, &["I........."]),
        ..ViewModel::default()
    };
    let fb = GameView::default().render(&view, Viewport::new(22, 24));

    // Bottom playfield row is the last row inside the border.
    assert_eq!(fb.get(1, 22).unwrap().ch, '█');
    assert_eq!(fb.get(2, 22).unwrap().ch, '█');
    assert_eq!(fb.get(3, 22).unwrap().ch, '·');
}

#[test]
fn term_view_draws_side_panel_when_wide_enough() {
    let view = ViewModel {
        figures: Figures {
            level: 2,
            lines: 10,
            score: 1234,
        },
        hold: Some(Tetromino::spawn(PieceKind::T)),
        seconds: 75,
        ..ViewModel::default()
    };

    let narrow = screen_text(&GameView::default().render(&view, Viewport::new(22, 24)));
    assert!(!narrow.contains("SCORE"));

    let wide = screen_text(&GameView::default().render(&view, Viewport::new(60, 24)));
    assert!(wide.contains("SCORE"));
    assert!(wide.contains("1234"));
    assert!(wide.contains("HOLD"));
    assert!(wide.contains("1:15"));
    assert!(wide.contains("MARATHON"));
}

#[test]
fn term_view_follows_a_live_game() {
    let mut sim = Simulator::new(Rules::default(), TermPresenter::new()).unwrap();
    sim.start(GameMode::Marathon, 77, 0);
    sim.hard_drop();
    sim.advance_to(1_000);

    let fb = GameView::default().render(sim.presenter().view(), Viewport::new(60, 26));
    let text = screen_text(&fb);
    assert!(text.contains('█'));
    assert!(text.contains("NEXT"));
    assert!(!text.contains("GAME OVER"));
}
