use kernel_sync::{GlobalSlot, SlotError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn lifecycle_install_use_teardown() {
    let slot = GlobalSlot::new();
    assert!(!slot.is_installed());
    assert_eq!(slot.with(|v: &mut u32| *v), Err(SlotError::NotInstalled));

    slot.install(10_u32).unwrap();
    assert!(slot.is_installed());
    assert_eq!(slot.install(11), Err(SlotError::AlreadyInstalled));
    assert_eq!(slot.with(|v| *v), Ok(10));

    assert_eq!(slot.teardown(), Ok(10));
    assert_eq!(slot.teardown(), Err(SlotError::NotInstalled));

    // A torn-down slot can be installed again.
    slot.install(12).unwrap();
    assert_eq!(slot.with(|v| *v), Ok(12));
}

#[test]
fn install_with_skips_construction_when_occupied() {
    let slot = GlobalSlot::new();
    assert_eq!(
        slot.install_with(|| Err::<u32, _>(SlotError::NotInstalled)),
        Err(SlotError::NotInstalled)
    );
    assert!(!slot.is_installed());

    assert_eq!(slot.install_with(|| Ok::<_, SlotError>(1_u32)), Ok(()));
    let mut called = false;
    let result = slot.install_with(|| {
        called = true;
        Ok::<_, SlotError>(2)
    });
    assert_eq!(result, Err(SlotError::AlreadyInstalled));
    assert!(!called);
    assert_eq!(slot.with(|v| *v), Ok(1));
}

#[test]
fn racing_install_with_constructs_once() {
    let slot = Arc::new(GlobalSlot::new());
    let built = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let (slot, built, barrier) = (Arc::clone(&slot), Arc::clone(&built), Arc::clone(&barrier));
            thread::spawn(move || {
                barrier.wait();
                slot.install_with(|| {
                    built.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, SlotError>(t)
                })
                .is_ok()
            })
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&ok| ok)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn closures_are_serialized() {
    let slot = Arc::new(GlobalSlot::new());
    slot.install(Vec::<usize>::new()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..1_000 {
                    slot.with(|v| {
                        // A read-modify-write pair that would tear without the lock.
                        let len = v.len();
                        v.push(t * 1_000 + i);
                        assert_eq!(v.len(), len + 1);
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(slot.with(|v| v.len()), Ok(4_000));
}

#[test]
fn error_messages() {
    assert_eq!(
        SlotError::NotInstalled.to_string(),
        "global instance not installed"
    );
}
