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

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Barrier,
    },
    thread::{scope, sleep},
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Clone, Copy, Debug)]
pub struct RaceConfig {
    pub threads: usize,
    pub max_jitter: Duration,
    pub seed: u64,
}

impl RaceConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            threads: 16,
            max_jitter: Duration::from_micros(200),
            seed,
        }
    }
}

// Runs `read` in `config.threads` threads released at once by a barrier,
// each delayed by a random jitter, and returns the results in thread order.
pub fn race_reads<R: Send>(config: RaceConfig, read: impl Fn() -> R + Sync) -> Vec<R> {
    let barrier = Barrier::new(config.threads);
    let max_jitter = config.max_jitter.as_micros() as u64;

    scope(|scope| {
        let handles = (0..config.threads)
            .map(|index| {
                let barrier = &barrier;
                let read = &read;

                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(config.seed + index as u64);
                    let jitter = Duration::from_micros(rng.gen_range(0..=max_jitter));

                    let _ = barrier.wait();

                    sleep(jitter);

                    read()
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(_) => panic!("Reader thread panicked."),
            })
            .collect()
    })
}

/// An initializer body that counts its invocations.
#[derive(Default)]
pub struct CallCounter {
    calls: AtomicUsize,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns the number of invocations including this one.
    pub fn next(&self) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Detects initializers of the same lock domain running at the same time.
#[derive(Default)]
pub struct OverlapTracker {
    busy: AtomicBool,
    overlaps: AtomicUsize,
}

impl OverlapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, hold: Duration) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        sleep(hold);

        self.busy.store(false, Ordering::SeqCst);
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}
