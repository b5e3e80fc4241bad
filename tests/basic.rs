//! Black-box tests against the bare `allocate`/`deallocate` surface.

use tiered_alloc::{allocate, deallocate};

#[test]
fn single_thread_churn_reuses_the_freed_block() {
    let a = allocate(24);
    assert!(!a.is_null());
    deallocate(a, 24);
    let b = allocate(24);
    assert_eq!(a, b);
    deallocate(b, 24);
}

#[test]
fn zero_size_request_returns_a_valid_block() {
    let p = allocate(0);
    assert!(!p.is_null());
    deallocate(p, 0);
}

#[test]
fn max_small_boundary() {
    let p = allocate(262_144);
    assert!(!p.is_null());
    unsafe {
        p.write_bytes(0x5A, 262_144);
        for i in 0..262_144 {
            assert_eq!(*p.add(i), 0x5A);
        }
    }
    deallocate(p, 262_144);
}

#[test]
fn above_max_small_goes_through_the_large_path() {
    let p = allocate(262_145);
    assert!(!p.is_null());
    unsafe { p.write_bytes(0x5B, 262_145) };
    deallocate(p, 262_145);
}

#[test]
fn disjoint_live_allocations() {
    let mut ptrs = Vec::new();
    for size in [16usize, 32, 64, 128, 256, 512, 1024, 2048, 4096, 9000] {
        let p = allocate(size);
        assert!(!p.is_null());
        ptrs.push((p, size));
    }

    for i in 0..ptrs.len() {
        for j in (i + 1)..ptrs.len() {
            let (p1, s1) = ptrs[i];
            let (p2, s2) = ptrs[j];
            let (a1, a2) = (p1 as usize, p2 as usize);
            let overlap = a1 < a2 + s2 && a2 < a1 + s1;
            assert!(!overlap, "overlap between allocations {i} and {j}");
        }
    }

    for (p, size) in ptrs {
        deallocate(p, size);
    }
}

#[test]
fn concurrent_hammer_keeps_addresses_disjoint() {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    let seen: Arc<Mutex<HashSet<usize>>> = Arc::new(Mutex::new(HashSet::new()));
    let nthreads = 6;
    let ops = 300;

    let handles: Vec<_> = (0..nthreads)
        .map(|tid| {
            let seen = Arc::clone(&seen);
            std::thread::spawn(move || {
                let mut live = Vec::new();
                for i in 0..ops {
                    let size = [8, 24, 100, 1000, 50_000][(tid + i) % 5];
                    let p = allocate(size);
                    assert!(!p.is_null());
                    live.push((p, size));

                    if live.len() > 20 {
                        let (p, size) = live.remove(0);
                        deallocate(p, size);
                    }
                }
                for (p, _size) in &live {
                    assert!(
                        seen.lock().unwrap().insert(*p as usize),
                        "duplicate address returned across threads: {p:?}"
                    );
                }
                for (p, size) in live {
                    deallocate(p, size);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
