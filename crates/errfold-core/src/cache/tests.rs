//! Tests for the result cache and debouncer

use super::*;
use tokio::sync::mpsc;

const GUARD: [&str; 3] = ["if err != nil {", "    return err", "}"];
const PLAIN: [&str; 2] = ["x := 1", "fmt.Println(x)"];

fn guard_lines() -> Vec<String> {
    GUARD.iter().map(|s| s.to_string()).collect()
}

fn plain_lines() -> Vec<String> {
    PLAIN.iter().map(|s| s.to_string()).collect()
}

// ==================== GET OR SCAN ====================

mod lookup_tests {
    use super::*;

    #[test]
    fn test_same_version_hits_cache() {
        let cache = BlockCache::default();

        let first = cache.get_or_scan("file:///a.go", 1, &GUARD);
        let second = cache.get_or_scan("file:///a.go", 1, &GUARD);

        assert_eq!(cache.scan_count(), 1, "second lookup must not rescan");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_hit_ignores_lines_passed() {
        let cache = BlockCache::default();

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        let blocks = cache.get_or_scan("file:///a.go", 1, &PLAIN);

        // Version is the key; same version means same content
        assert_eq!(blocks.len(), 1);
        assert_eq!(cache.scan_count(), 1);
    }

    #[test]
    fn test_version_bump_rescans() {
        let cache = BlockCache::default();

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        let blocks = cache.get_or_scan("file:///a.go", 2, &PLAIN);

        assert_eq!(cache.scan_count(), 2);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_invalidate_forces_rescan() {
        let cache = BlockCache::default();

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        cache.invalidate("file:///a.go");
        assert!(cache.is_empty());

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_invalidate_unknown_document_is_noop() {
        let cache = BlockCache::default();
        cache.invalidate("file:///missing.go");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_documents_are_independent() {
        let cache = BlockCache::default();

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        cache.get_or_scan("file:///b.go", 1, &PLAIN);
        cache.invalidate("file:///b.go");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_or_scan("file:///a.go", 1, &GUARD).len(), 1);
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = BlockCache::default();
        let other = cache.clone();

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        other.get_or_scan("file:///a.go", 1, &GUARD);

        assert_eq!(other.scan_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = BlockCache::default();

        cache.get_or_scan("file:///a.go", 1, &GUARD);

        tokio::time::advance(Duration::from_millis(4999)).await;
        cache.get_or_scan("file:///a.go", 1, &GUARD);
        assert_eq!(cache.scan_count(), 1, "still fresh just under the TTL");

        tokio::time::advance(Duration::from_millis(2)).await;
        cache.get_or_scan("file:///a.go", 1, &GUARD);
        assert_eq!(cache.scan_count(), 2, "stale entries are rescanned");
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl_from_settings() {
        let settings = Settings::from_toml_str("[cache]\nttl_ms = 100\n").unwrap();
        let cache = BlockCache::from_settings(&settings);
        assert_eq!(cache.ttl(), Duration::from_millis(100));

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        tokio::time::advance(Duration::from_millis(150)).await;
        cache.get_or_scan("file:///a.go", 1, &GUARD);

        assert_eq!(cache.scan_count(), 2);
    }
}

// ==================== DEBOUNCE ====================

mod debounce_tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_coalesce() {
        let cache = BlockCache::default();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for version in 1..=5 {
            let lines = if version == 5 {
                guard_lines()
            } else {
                plain_lines()
            };
            let tx = tx.clone();
            cache
                .schedule_debounced("file:///a.go", version, lines, DELAY, move |blocks| {
                    let _ = tx.send((version, blocks));
                })
                .unwrap();
            tokio::time::advance(Duration::from_millis(50)).await;
        }
        assert_eq!(cache.pending_count(), 1);

        tokio::time::sleep(DELAY * 2).await;

        let (version, blocks) = rx.try_recv().expect("debounced scan should have fired");
        assert_eq!(version, 5);
        assert_eq!(blocks.len(), 1, "the last lines are the ones scanned");
        assert!(rx.try_recv().is_err(), "only one callback");
        assert_eq!(cache.scan_count(), 1);
        assert_eq!(cache.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_before_delay() {
        let cache = BlockCache::default();
        let (tx, mut rx) = mpsc::unbounded_channel();

        cache
            .schedule_debounced("file:///a.go", 1, guard_lines(), DELAY, move |blocks| {
                let _ = tx.send(blocks);
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(cache.scan_count(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_schedules_each_fire() {
        let cache = BlockCache::default();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for version in 1..=2 {
            let tx = tx.clone();
            cache
                .schedule_debounced("file:///a.go", version, guard_lines(), DELAY, move |_| {
                    let _ = tx.send(version);
                })
                .unwrap();
            tokio::time::sleep(DELAY * 2).await;
        }

        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert_eq!(cache.scan_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_documents_debounce_independently() {
        let cache = BlockCache::default();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for doc in ["file:///a.go", "file:///b.go"] {
            let tx = tx.clone();
            cache
                .schedule_debounced(doc, 1, guard_lines(), DELAY, move |_| {
                    let _ = tx.send(doc);
                })
                .unwrap();
        }
        assert_eq!(cache.pending_count(), 2);

        tokio::time::sleep(DELAY * 2).await;

        let mut fired = vec![rx.try_recv().unwrap(), rx.try_recv().unwrap()];
        fired.sort();
        assert_eq!(fired, vec!["file:///a.go", "file:///b.go"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_scan_fills_cache() {
        let cache = BlockCache::default();

        cache
            .schedule_debounced("file:///a.go", 3, guard_lines(), DELAY, |_| {})
            .unwrap();
        tokio::time::sleep(DELAY * 2).await;

        cache.get_or_scan("file:///a.go", 3, &GUARD);
        assert_eq!(cache.scan_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending() {
        let cache = BlockCache::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<Blocks>();

        cache
            .schedule_debounced("file:///a.go", 1, guard_lines(), DELAY, move |blocks| {
                let _ = tx.send(blocks);
            })
            .unwrap();

        assert!(cache.cancel_pending("file:///a.go"));
        assert!(!cache.cancel_pending("file:///a.go"));

        tokio::time::sleep(DELAY * 2).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(cache.scan_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_document_cancels_and_invalidates() {
        let cache = BlockCache::default();
        cache.get_or_scan("file:///a.go", 1, &GUARD);
        cache
            .schedule_debounced("file:///a.go", 2, guard_lines(), DELAY, |_| {})
            .unwrap();

        cache.close_document("file:///a.go");

        assert!(cache.is_empty());
        assert_eq!(cache.pending_count(), 0);
        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(cache.scan_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_all() {
        let cache = BlockCache::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<Blocks>();

        cache.get_or_scan("file:///a.go", 1, &GUARD);
        cache.get_or_scan("file:///b.go", 1, &GUARD);
        for doc in ["file:///c.go", "file:///d.go"] {
            let tx = tx.clone();
            cache
                .schedule_debounced(doc, 1, guard_lines(), DELAY, move |blocks| {
                    let _ = tx.send(blocks);
                })
                .unwrap();
        }

        cache.dispose_all();

        assert!(cache.is_empty());
        assert_eq!(cache.pending_count(), 0);
        tokio::time::sleep(DELAY * 2).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_schedule_without_runtime_fails() {
        let cache = BlockCache::default();
        let result = cache.schedule_debounced(
            "file:///a.go",
            1,
            guard_lines(),
            DELAY,
            |_| {},
        );
        assert!(matches!(result, Err(ErrfoldError::NoRuntime)));
        assert_eq!(cache.pending_count(), 0);
    }

    #[test]
    fn test_debounce_delay_from_settings() {
        let settings = Settings::from_toml_str("[cache]\ndebounce_ms = 25\n").unwrap();
        let cache = BlockCache::from_settings(&settings);
        assert_eq!(cache.debounce_delay(), Duration::from_millis(25));
    }
}

// ==================== RECONFIGURE ====================

mod reconfigure_tests {
    use super::*;

    #[test]
    fn test_same_fragments_keep_matcher() {
        let cache = BlockCache::default();
        let changed = cache.reconfigure(&DetectionSettings::default()).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_new_fragments_apply_after_invalidate() {
        let cache = BlockCache::default();
        let lines = ["if failure != nil {", "    return failure", "}"];

        assert!(cache.get_or_scan("file:///a.go", 1, &lines).is_empty());

        let detection = DetectionSettings {
            error_variables: vec!["fail".to_string()],
        };
        assert!(cache.reconfigure(&detection).unwrap());

        // Existing entries survive a settings change
        assert!(cache.get_or_scan("file:///a.go", 1, &lines).is_empty());

        cache.invalidate("file:///a.go");
        assert_eq!(cache.get_or_scan("file:///a.go", 1, &lines).len(), 1);
    }

    #[test]
    fn test_empty_fragments_detect_nothing() {
        let cache = BlockCache::default();
        let detection = DetectionSettings {
            error_variables: Vec::new(),
        };
        cache.reconfigure(&detection).unwrap();

        assert!(cache.get_or_scan("file:///a.go", 1, &GUARD).is_empty());
    }
}

// ==================== PER-DOCUMENT SCAN GUARD ====================

mod guard_tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_concurrent_misses_scan_once() {
        let cache = BlockCache::default();
        let barrier = Barrier::new(8);

        let results: Vec<Blocks> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_or_scan("file:///a.go", 1, &GUARD)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.scan_count(), 1, "one writer per document");
        assert!(results.iter().all(|blocks| Arc::ptr_eq(blocks, &results[0])));
    }

    #[test]
    fn test_busy_document_does_not_block_others() {
        let cache = BlockCache::default();
        cache.get_or_scan("file:///a.go", 1, &GUARD);

        // Simulate a long scan in progress on a.go
        let guard = cache.scan_guard("file:///a.go");
        let _scanning = guard.lock();

        let other = cache.clone();
        let blocks = thread::spawn(move || other.get_or_scan("file:///b.go", 1, &GUARD))
            .join()
            .unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(cache.scan_count(), 2);
        // Hits on the busy document do not wait either
        assert_eq!(cache.get_or_scan("file:///a.go", 1, &GUARD).len(), 1);
    }

    #[test]
    fn test_close_document_drops_guard() {
        let cache = BlockCache::default();
        cache.get_or_scan("file:///a.go", 1, &GUARD);
        cache.get_or_scan("file:///b.go", 1, &GUARD);

        cache.close_document("file:///a.go");
        assert_eq!(cache.shared.state.lock().scan_guards.len(), 1);

        cache.dispose_all();
        assert!(cache.shared.state.lock().scan_guards.is_empty());
    }
}
