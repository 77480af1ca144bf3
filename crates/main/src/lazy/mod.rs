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

mod unsync;

use std::fmt::{Display, Formatter};

pub use crate::lazy::unsync::UnsyncLazyVar;
use crate::sync::{InitLock, RaceLazyVar, SyncLazyVar};

/// A description of a binding that has not been initialized yet.
///
/// The [Display] implementations of all LazyVar objects, and the
/// [LazyVar::describe] function, print this message instead of the value
/// until the value is computed or written.
pub const NOT_INITIALIZED: &str = "LazyVar value not initialized yet.";

/// A common interface of the lazily-initialized mutable bindings.
///
/// A binding holds a value of type `T` that is computed by the binding's
/// initializer function on the first [read](LazyVar::read) access, and then
/// memoized for all subsequent reads. The value can also be overwritten
/// explicitly with the [write](LazyVar::write) function, which discards the
/// initializer without calling it.
///
/// There are three implementations of this trait, one per [LazyMode]:
///
///  - [SyncLazyVar] guards the initialization by a lock, such that the
///    initializer is called at most once.
///  - [RaceLazyVar] lets concurrent threads race their initializers and
///    publishes the first computed value with a compare-and-set operation.
///  - [UnsyncLazyVar] does not synchronize anything, and therefore cannot be
///    shared between threads.
///
/// Each of these objects exposes the same functions as inherent methods, so
/// the trait is mostly useful for the code that selects a strategy at
/// runtime (see [lazy_var]).
pub trait LazyVar<T> {
    /// Returns a reference to the value, computing it first if the binding
    /// is not initialized yet.
    ///
    /// If the initializer panics, the panic propagates to the caller, and
    /// the binding remains uninitialized, such that the next call to this
    /// function would try to initialize it again.
    fn read(&self) -> &T;

    /// Overwrites the value of this binding.
    ///
    /// The binding becomes initialized regardless of its previous state, and
    /// the initializer function is dropped without being called.
    fn write(&mut self, value: T);

    /// Returns a reference to the value if the binding has been initialized.
    ///
    /// This function never calls the initializer.
    fn get(&self) -> Option<&T>;

    /// Returns true if the binding has been initialized.
    ///
    /// This function never calls the initializer.
    fn is_initialized(&self) -> bool;

    /// Returns the initialization strategy of this binding.
    fn mode(&self) -> LazyMode;

    /// Returns a human-readable description of this binding.
    ///
    /// The description is the value's [Display] form if the binding is
    /// initialized, or the [NOT_INITIALIZED] message otherwise.
    ///
    /// This function never calls the initializer.
    fn describe(&self) -> String
    where
        T: Display,
    {
        match self.get() {
            Some(value) => value.to_string(),
            None => String::from(NOT_INITIALIZED),
        }
    }
}

/// An initialization strategy of a lazily-initialized binding.
///
/// The strategy is fixed when the binding is created. The default strategy
/// is [Locked](LazyMode::Locked).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LazyMode {
    /// The initialization is guarded by a lock, and the initializer is called
    /// at most once. Implemented by [SyncLazyVar].
    #[default]
    Locked,

    /// The initializer may be called by several threads concurrently, but
    /// only one of the computed values is published. Implemented by
    /// [RaceLazyVar].
    Publication,

    /// No synchronization at all. Implemented by [UnsyncLazyVar].
    Unsynchronized,
}

impl Display for LazyMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => formatter.write_str("locked"),
            Self::Publication => formatter.write_str("publication"),
            Self::Unsynchronized => formatter.write_str("unsynchronized"),
        }
    }
}

/// Creates a lazily-initialized binding with the initialization strategy
/// selected at runtime.
///
/// ```
/// use lazyvar::lazy::{lazy_var, LazyMode};
///
/// let mut binding = lazy_var(LazyMode::Publication, || 10 + 20);
///
/// assert_eq!(binding.mode(), LazyMode::Publication);
/// assert!(!binding.is_initialized());
/// assert_eq!(binding.read(), &30);
///
/// binding.write(40);
///
/// assert_eq!(binding.describe(), "40");
/// ```
///
/// The returned object can be moved between threads, but it is not [Sync]
/// because the [Unsynchronized](LazyMode::Unsynchronized) strategy cannot be
/// shared. If you need to share the binding between threads, use
/// the [sync_lazy_var] function instead.
pub fn lazy_var<T, F>(mode: LazyMode, init: F) -> Box<dyn LazyVar<T> + Send>
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    match mode {
        LazyMode::Locked => Box::new(SyncLazyVar::new(init)),
        LazyMode::Publication => Box::new(RaceLazyVar::new(init)),
        LazyMode::Unsynchronized => Box::new(UnsyncLazyVar::new(init)),
    }
}

/// Creates a thread-safe lazily-initialized binding with the initialization
/// strategy selected at runtime.
///
/// The `lock` argument is a mutual-exclusion domain of
/// the [Locked](LazyMode::Locked) strategy. If omitted, the binding uses
/// a private lock. The [Publication](LazyMode::Publication) strategy does not
/// use locks, and ignores this argument.
///
/// Returns None for the [Unsynchronized](LazyMode::Unsynchronized) strategy,
/// because such binding cannot be shared between threads.
///
/// ```
/// use lazyvar::{
///     lazy::{sync_lazy_var, LazyMode},
///     sync::InitLock,
/// };
///
/// let binding = sync_lazy_var(LazyMode::Locked, Some(InitLock::new()), || 10 + 20).unwrap();
///
/// std::thread::scope(|scope| {
///     for _ in 0..4 {
///         scope.spawn(|| assert_eq!(binding.read(), &30));
///     }
/// });
///
/// assert!(sync_lazy_var(LazyMode::Unsynchronized, None, || 0).is_none());
/// ```
pub fn sync_lazy_var<T, F>(
    mode: LazyMode,
    lock: Option<InitLock>,
    init: F,
) -> Option<Box<dyn LazyVar<T> + Send + Sync>>
where
    T: Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    match mode {
        LazyMode::Locked => match lock {
            Some(lock) => Some(Box::new(SyncLazyVar::with_lock(lock, init))),
            None => Some(Box::new(SyncLazyVar::new(init))),
        },

        LazyMode::Publication => Some(Box::new(RaceLazyVar::new(init))),

        LazyMode::Unsynchronized => None,
    }
}

pub(crate) fn fmt_described<T: Display>(
    value: Option<&T>,
    formatter: &mut Formatter<'_>,
) -> std::fmt::Result {
    match value {
        Some(value) => Display::fmt(value, formatter),
        None => formatter.write_str(NOT_INITIALIZED),
    }
}
