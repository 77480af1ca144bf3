////////////////////////////////////////////////////////////////////////////////
// This file is part of "Lazy Var", a library of lazily-initialized           //
// mutable bindings with configurable thread-safety.                          //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

pub mod race;

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use lazyvar::{
        lazy::{lazy_var, LazyMode, UnsyncLazyVar, NOT_INITIALIZED},
        sync::{InitLock, RaceLazyVar, SyncLazyVar},
    };

    use crate::race::{race_reads, CallCounter, OverlapTracker, RaceConfig};

    const SEED: u64 = 1000;
    const ITERATIONS: u64 = 20;

    const MODES: [LazyMode; 3] = [
        LazyMode::Locked,
        LazyMode::Publication,
        LazyMode::Unsynchronized,
    ];

    #[test]
    fn test_locked_single_invocation() {
        for iteration in 1..=ITERATIONS {
            let config = RaceConfig::new(SEED + iteration * 100);
            let counter = CallCounter::new();

            let binding = SyncLazyVar::new(|| {
                std::thread::sleep(Duration::from_micros(100));

                counter.next()
            });

            let results = race_reads(config, || *binding.read());

            assert_eq!(results, vec![1; config.threads]);
            assert_eq!(counter.calls(), 1, "Iteration {iteration}");
            assert!(binding.is_initialized());
        }
    }

    #[test]
    fn test_publication_convergence() {
        for iteration in 1..=ITERATIONS {
            let config = RaceConfig::new(SEED + iteration * 100);
            let counter = CallCounter::new();

            let binding = RaceLazyVar::new(|| {
                let value = counter.next();

                std::thread::sleep(Duration::from_micros(100));

                value
            });

            let results = race_reads(config, || *binding.read());
            let published = *binding.read();
            let calls = counter.calls();

            assert!(
                results.iter().all(|result| *result == published),
                "Iteration {iteration}: {results:?}"
            );
            assert!((1..=config.threads).contains(&calls));
            assert!((1..=calls).contains(&published));
        }
    }

    #[test]
    fn test_unsynchronized_single_thread() {
        let counter = CallCounter::new();

        let binding = UnsyncLazyVar::new(|| {
            let _ = counter.next();

            42
        });

        assert_eq!(binding.read(), &42);
        assert_eq!(counter.calls(), 1);

        assert_eq!(binding.read(), &42);
        assert_eq!(counter.calls(), 1);
    }

    #[test]
    fn test_memoization() {
        for mode in MODES {
            let counter = Arc::new(CallCounter::new());

            let binding = {
                let counter = counter.clone();

                lazy_var(mode, move || counter.next() * 7)
            };

            let first = *binding.read();

            assert!(binding.is_initialized());

            for _ in 0..10 {
                assert_eq!(binding.read(), &first);
            }

            assert_eq!(first, 7);
            assert_eq!(counter.calls(), 1, "Mode {mode}");
        }
    }

    #[test]
    fn test_write_before_read() {
        for mode in MODES {
            let calls = Arc::new(AtomicUsize::new(0));

            let mut binding = {
                let calls = calls.clone();

                lazy_var(mode, move || {
                    calls.fetch_add(1, Ordering::SeqCst);

                    String::from("computed")
                })
            };

            binding.write(String::from("written"));

            assert!(binding.is_initialized(), "Mode {mode}");
            assert_eq!(binding.read(), "written");
            assert_eq!(binding.describe(), "written");
            assert_eq!(calls.load(Ordering::SeqCst), 0, "Mode {mode}");
        }
    }

    #[test]
    fn test_describe() {
        for mode in MODES {
            let binding = lazy_var(mode, || 3.5);

            assert_eq!(binding.describe(), NOT_INITIALIZED);

            let _ = binding.read();

            assert_eq!(binding.describe(), "3.5");
        }
    }

    #[test]
    fn test_initializer_released() {
        for mode in MODES {
            let resource = Arc::new(());

            let binding = {
                let resource = resource.clone();

                lazy_var(mode, move || Arc::strong_count(&resource))
            };

            assert_eq!(Arc::strong_count(&resource), 2, "Mode {mode}");

            let _ = binding.read();

            assert_eq!(Arc::strong_count(&resource), 1, "Mode {mode}");

            let mut binding = {
                let resource = resource.clone();

                lazy_var(mode, move || Arc::strong_count(&resource))
            };

            binding.write(0);

            assert_eq!(Arc::strong_count(&resource), 1, "Mode {mode}");
            assert_eq!(binding.read(), &0);
        }
    }

    #[test]
    fn test_publication_initializer_released_after_race() {
        for iteration in 1..=ITERATIONS {
            let config = RaceConfig::new(SEED + iteration * 100);
            let resource = Arc::new(());

            let binding = {
                let resource = resource.clone();

                RaceLazyVar::new(move || {
                    std::thread::sleep(Duration::from_micros(100));

                    Arc::strong_count(&resource)
                })
            };

            let results = race_reads(config, || *binding.read());

            assert!(results.iter().all(|result| *result == results[0]));
            assert_eq!(
                Arc::strong_count(&resource),
                1,
                "Iteration {iteration}"
            );
        }
    }

    #[test]
    fn test_failure_then_success() {
        fn init(attempts: &AtomicUsize) -> Result<usize, String> {
            match attempts.fetch_add(1, Ordering::SeqCst) {
                0 => Err(String::from("not ready")),
                _ => Ok(5),
            }
        }

        let attempts = AtomicUsize::new(0);
        let locked = SyncLazyVar::new(|| init(&attempts));

        assert_eq!(locked.try_read(), Err(String::from("not ready")));
        assert!(!locked.is_initialized());
        assert_eq!(locked.try_read(), Ok(&5));
        assert!(locked.is_initialized());

        let attempts = AtomicUsize::new(0);
        let publication = RaceLazyVar::new(|| init(&attempts));

        assert_eq!(publication.try_read(), Err(String::from("not ready")));
        assert!(!publication.is_initialized());
        assert_eq!(publication.try_read(), Ok(&5));
        assert!(publication.is_initialized());

        let attempts = AtomicUsize::new(0);
        let unsynchronized = UnsyncLazyVar::new(|| init(&attempts));

        assert_eq!(unsynchronized.try_read(), Err(String::from("not ready")));
        assert!(!unsynchronized.is_initialized());
        assert_eq!(unsynchronized.try_read(), Ok(&5));
        assert!(unsynchronized.is_initialized());
    }

    #[test]
    fn test_shared_lock_domain() {
        const BINDINGS: usize = 4;

        for iteration in 1..=ITERATIONS / 4 {
            let config = RaceConfig::new(SEED + iteration * 100);
            let lock = InitLock::new();
            let tracker = OverlapTracker::new();

            let bindings = (0..BINDINGS)
                .map(|index| {
                    let tracker = &tracker;

                    SyncLazyVar::with_lock(lock.clone(), move || {
                        tracker.enter(Duration::from_millis(2));

                        index
                    })
                })
                .collect::<Vec<_>>();

            let next = AtomicUsize::new(0);

            let _ = race_reads(config, || {
                let index = next.fetch_add(1, Ordering::SeqCst) % BINDINGS;

                *bindings[index].read()
            });

            for (index, binding) in bindings.iter().enumerate() {
                assert_eq!(binding.get(), Some(&index));
                assert_eq!(binding.lock(), Some(&lock));
            }

            assert_eq!(tracker.overlaps(), 0, "Iteration {iteration}");
        }
    }

    #[test]
    fn test_static_binding() {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        static BINDING: SyncLazyVar<usize> =
            SyncLazyVar::new(|| COUNTER.fetch_add(1, Ordering::SeqCst) + 10);

        let results = race_reads(RaceConfig::new(SEED), || *BINDING.read());

        assert!(results.iter().all(|result| *result == 10));
        assert_eq!(COUNTER.load(Ordering::SeqCst), 1);
    }
}
