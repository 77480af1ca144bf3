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

#![deny(missing_docs)]

//! # Lazy Var API Documentation
//!
//! Lazy Var is a library of lazily-initialized mutable bindings. A binding
//! holds a value that is computed by the binding's initializer function on
//! the first access, and then memoized. Unlike the standard
//! [OnceLock](std::sync::OnceLock), the binding's value can be overwritten
//! later on, and the initialization strategy is configurable.
//!
//! ## Initialization Strategies
//!
//! There are three bindings, one per [LazyMode](lazy::LazyMode):
//!
//!  - [SyncLazyVar](sync::SyncLazyVar) is the default choice. It initializes
//!    the value under a lock (private, or shared with other bindings through
//!    the [InitLock](sync::InitLock)), and calls the initializer at most once.
//!  - [RaceLazyVar](sync::RaceLazyVar) never blocks the readers. Concurrent
//!    readers may compute the value redundantly, but only the first computed
//!    value is published.
//!  - [UnsyncLazyVar](lazy::UnsyncLazyVar) has no synchronization costs at
//!    all, but it cannot be shared between threads.
//!
//! All of them implement the [LazyVar](lazy::LazyVar) trait, and the
//! [lazy_var](lazy::lazy_var) function selects the strategy at runtime.
//!
//! ```
//! use lazyvar::{lazy::LazyVar, sync::SyncLazyVar};
//!
//! struct Document {
//!     title: SyncLazyVar<String>,
//! }
//!
//! let mut document = Document {
//!     title: SyncLazyVar::new(|| String::from("Untitled")),
//! };
//!
//! assert!(!document.title.is_initialized());
//! assert_eq!(document.title.read(), "Untitled");
//!
//! document.title.write(String::from("Report"));
//!
//! assert_eq!(document.title.describe(), "Report");
//! ```
//!
//! ## Initialization Failures
//!
//! If the initializer panics, the panic propagates to the reader, and the
//! binding remains uninitialized: the next read calls the initializer again.
//! The initializers that return a [Result] can be called through the
//! `try_read` functions, which return the initializer's error as is without
//! recording anything in the binding.
//!
//! ## Diagnostics
//!
//! With the `tracing` feature enabled (default), the initialization slow
//! paths emit trace-level events under the `lazyvar` target through the
//! [tracing](https://docs.rs/tracing) facade.
//!
//! ## Copyright
//!
//! This work is proprietary software with source-available code.
//!
//! Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин). All rights reserved.

/// Lazily-initialized bindings interface.
///
/// This module provides the [LazyVar](lazy::LazyVar) trait implemented by
/// all bindings, the [LazyMode](lazy::LazyMode) enumeration of
/// the initialization strategies, and the single-threaded
/// [UnsyncLazyVar](lazy::UnsyncLazyVar) binding.
pub mod lazy;

/// Thread-safe lazily-initialized bindings.
///
///  - [SyncLazyVar](sync::SyncLazyVar) initializes its value under a lock.
///  - [RaceLazyVar](sync::RaceLazyVar) publishes the first computed value
///    with an atomic compare-and-set operation.
///  - [InitLock](sync::InitLock) is a mutual-exclusion domain that several
///    SyncLazyVar objects can share.
pub mod sync;

mod report;
