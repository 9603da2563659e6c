#![allow(clippy::unwrap_used)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::{AtomicIsize, Ordering};

use shellgibi::shell::parser::parse;

struct Counting;

static LIVE: AtomicIsize = AtomicIsize::new(0);

thread_local! {
    static TRACKING: Cell<bool> = const { Cell::new(false) };
}

fn tracking() -> bool {
    TRACKING.try_with(Cell::get).unwrap_or(false)
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if tracking() {
            LIVE.fetch_add(1, Ordering::SeqCst);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if tracking() {
            LIVE.fetch_sub(1, Ordering::SeqCst);
        }
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

/// Net allocations made by `f` on this thread, with its result already dropped.
fn net_allocations(f: impl FnOnce()) -> isize {
    TRACKING.with(|t| t.set(true));
    let before = LIVE.load(Ordering::SeqCst);
    f();
    let after = LIVE.load(Ordering::SeqCst);
    TRACKING.with(|t| t.set(false));
    after - before
}

#[test]
fn dropping_a_simple_chain_frees_everything() {
    let mut allocated = false;
    let net = net_allocations(|| {
        let chain = parse("cmd a b").unwrap();
        allocated = chain.first().arguments.len() == 2;
        drop(chain);
    });
    assert!(allocated);
    assert_eq!(net, 0);
}

#[test]
fn dropping_a_redirected_pipeline_frees_everything() {
    let net = net_allocations(|| {
        let chain = parse("cat 'in file' | sort -r >out.txt &").unwrap();
        assert_eq!(chain.len(), 2);
        drop(chain);
    });
    assert_eq!(net, 0);
}

#[test]
fn failed_parse_frees_everything() {
    let net = net_allocations(|| {
        assert!(parse("echo 'unterminated").is_err());
    });
    assert_eq!(net, 0);
}
