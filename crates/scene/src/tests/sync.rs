use crate::sync::{Arc, Mutex};

#[test]
fn mutex_guards_shared_value() {
    let counter = Arc::new(Mutex::<u32>::default());
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    *counter.lock() += 1;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(*counter.lock(), 4_000);
}
