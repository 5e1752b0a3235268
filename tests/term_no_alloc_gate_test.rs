use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use srs_tetris::engine::{Rules, Simulator};
use srs_tetris::term::{FrameBuffer, GameView, TermPresenter, Viewport};
use srs_tetris::types::GameMode;

struct CountingAlloc;

static COUNT_ENABLED: AtomicBool = AtomicBool::new(false);
static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.realloc(ptr, layout, new_size)
    }
}

fn with_alloc_counting<F: FnOnce()>(f: F) -> usize {
    ALLOC_COUNT.store(0, Ordering::Relaxed);
    COUNT_ENABLED.store(true, Ordering::Relaxed);
    f();
    COUNT_ENABLED.store(false, Ordering::Relaxed);
    ALLOC_COUNT.load(Ordering::Relaxed)
}

#[test]
fn term_game_view_render_is_allocation_free_after_warmup() {
    let view = GameView::default();
    let viewport = Viewport::new(80, 30);
    let mut fb = FrameBuffer::new(viewport.width, viewport.height);

    let mut sim = Simulator::new(Rules::default(), TermPresenter::new()).unwrap();
    sim.start(GameMode::Ultra, 1, 0);
    sim.advance_to(5_000);

    // Warm-up (resize/initial clears).
    view.render_into(sim.presenter().view(), viewport, &mut fb);

    let model = sim.presenter().view();
    let allocs = with_alloc_counting(|| {
        for _ in 0..200 {
            view.render_into(model, viewport, &mut fb);
        }
    });

    assert_eq!(allocs, 0);
}
