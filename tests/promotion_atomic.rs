// tests/promotion_atomic.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tbuild::fs::{FileSystem, RealFileSystem};

fn payload(version: u8) -> Vec<u8> {
    vec![version; 256 * 1024]
}

#[test]
fn readers_never_observe_a_partial_binary() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join(".built");
    let stable = dir.path().join("tbuild-bin");
    let fs = RealFileSystem;

    fs.write(&stable, &payload(0)).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let done = Arc::clone(&done);
        let stable = stable.clone();
        thread::spawn(move || {
            let mut reads = 0usize;
            while !done.load(Ordering::SeqCst) {
                let bytes = std::fs::read(&stable).expect("stable path must always exist");
                assert_eq!(bytes.len(), 256 * 1024, "short read of stable binary");
                let first = bytes[0];
                assert!(
                    bytes.iter().all(|b| *b == first),
                    "mixed contents in stable binary"
                );
                reads += 1;
            }
            reads
        })
    };

    for version in 1..=50u8 {
        fs.write(&artifact, &payload(version)).unwrap();
        fs.rename(&artifact, &stable).unwrap();
        assert!(!fs.exists(&artifact));
    }

    done.store(true, Ordering::SeqCst);
    let reads = reader.join().unwrap();
    assert!(reads > 0);
    assert_eq!(fs.read(&stable).unwrap(), payload(50));
}

#[test]
fn promoting_a_missing_artifact_keeps_the_old_binary() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join(".built");
    let stable = dir.path().join("tbuild-bin");
    let fs = RealFileSystem;
    fs.write(&stable, b"old").unwrap();

    assert!(fs.rename(&artifact, &stable).is_err());
    assert_eq!(fs.read(&stable).unwrap(), b"old");
}
