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
    cell::UnsafeCell,
    convert::Infallible,
    fmt::{Debug, Display, Formatter},
    marker::PhantomData,
    ptr::null_mut,
    sync::atomic::{AtomicPtr, Ordering},
};

use crate::{
    lazy::{fmt_described, LazyMode, LazyVar},
    report::{system_panic, trace_event},
    sync::lock::{InitLock, LockDomain},
};

/// A thread-safe lazily-initialized binding guarded by a lock.
///
/// This object implements the [Locked](LazyMode::Locked) strategy, which is
/// the default one. The binding computes its value on the first
/// [read](Self::read) access using the double-checked locking:
///
///  1. If the value is already initialized, the read function returns it
///     without acquiring any lock.
///  2. Otherwise, the function acquires the binding's lock, and checks the
///     value again, because another thread could initialize it while this
///     thread was waiting for the lock.
///  3. If the value is still uninitialized, the function calls the
///     initializer, publishes the value, and drops the initializer before
///     releasing the lock.
///
/// As a result, the initializer is called at most once even if several
/// threads read the uninitialized binding concurrently. These threads block
/// until the initialization is finished, and all of them observe the same
/// value.
///
/// SyncLazyVar is thread-safe and can be used in statics:
///
/// ```
/// use lazyvar::sync::SyncLazyVar;
///
/// static FOO: SyncLazyVar<usize> = SyncLazyVar::new(|| 10 + 20);
///
/// let a: &'static usize = FOO.read(); // first access implies initialization
///
/// assert_eq!(*a, 30);
/// ```
///
/// By default, each binding has a private lock. The
/// [with_lock](Self::with_lock) constructor puts the binding into a
/// mutual-exclusion domain shared with other bindings (see [InitLock]).
///
/// The initializer should not read its own binding directly or indirectly.
/// The exact behavior of the recurrent reading is not specified, but usually
/// leads to a deadlock, and may panic on some platforms.
pub struct SyncLazyVar<T, F = fn() -> T> {
    value: AtomicPtr<T>,
    init: UnsafeCell<Option<F>>,
    lock: LockDomain,
    _phantom: PhantomData<Box<T>>,
}

// Safety:
//   1. The value is published by the Release store and observed by
//      the Acquire loads, so the readers of other threads receive fully
//      constructed data.
//   2. The initializer is accessed by one thread at a time under the lock,
//      or under exclusive access.
unsafe impl<T: Send + Sync, F: Send> Sync for SyncLazyVar<T, F> {}

// Safety: SyncLazyVar owns the boxed value and the initializer.
unsafe impl<T: Send, F: Send> Send for SyncLazyVar<T, F> {}

impl<T: Debug, F> Debug for SyncLazyVar<T, F> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(value) => formatter.debug_tuple("SyncLazyVar").field(value).finish(),
            None => formatter.write_str("SyncLazyVar(<uninit>)"),
        }
    }
}

impl<T: Display, F> Display for SyncLazyVar<T, F> {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        fmt_described(self.get(), formatter)
    }
}

impl<T, F> Drop for SyncLazyVar<T, F> {
    fn drop(&mut self) {
        let value = *self.value.get_mut();

        if !value.is_null() {
            // Safety: Non-null pointer is a valid data leaked from the Box
            //         owned by this binding.
            let _ = unsafe { Box::from_raw(value) };
        }
    }
}

impl<T, F: FnMut() -> T> LazyVar<T> for SyncLazyVar<T, F> {
    #[inline(always)]
    fn read(&self) -> &T {
        SyncLazyVar::read(self)
    }

    #[inline(always)]
    fn write(&mut self, value: T) {
        SyncLazyVar::write(self, value)
    }

    #[inline(always)]
    fn get(&self) -> Option<&T> {
        SyncLazyVar::get(self)
    }

    #[inline(always)]
    fn is_initialized(&self) -> bool {
        SyncLazyVar::is_initialized(self)
    }

    #[inline(always)]
    fn mode(&self) -> LazyMode {
        LazyMode::Locked
    }
}

impl<T, F: FnMut() -> T> SyncLazyVar<T, F> {
    /// Returns a reference to the value, calling the initializer first if
    /// the binding is not initialized yet.
    ///
    /// This function blocks the current thread if another thread is
    /// currently initializing this binding, or another binding of the same
    /// [InitLock] domain.
    ///
    /// If the initializer panics, the binding remains uninitialized and keeps
    /// the initializer for the next attempt.
    #[inline]
    pub fn read(&self) -> &T {
        match self.init_with(|init| Ok::<T, Infallible>(init())) {
            Ok(value) => value,
            Err(error) => match error {},
        }
    }
}

impl<T, E, F: FnMut() -> Result<T, E>> SyncLazyVar<T, F> {
    /// Returns a reference to the value, calling the fallible initializer
    /// first if the binding is not initialized yet.
    ///
    /// If the initializer returns an error, this function returns this error
    /// as is, and the binding remains uninitialized. The next call to this
    /// function would call the initializer again.
    #[inline]
    pub fn try_read(&self) -> Result<&T, E> {
        self.init_with(|init| init())
    }
}

impl<T, F> SyncLazyVar<T, F> {
    /// Creates a new uninitialized binding with the `init` initializer
    /// function and a private lock.
    ///
    /// The constructor is a const function, so the binding can be placed in
    /// a static.
    #[inline(always)]
    pub const fn new(init: F) -> Self {
        Self {
            value: AtomicPtr::new(null_mut()),
            init: UnsafeCell::new(Some(init)),
            lock: LockDomain::private(),
            _phantom: PhantomData,
        }
    }

    /// Creates a new uninitialized binding with the `init` initializer
    /// function that initializes its value under the `lock` shared with other
    /// bindings.
    #[inline(always)]
    pub fn with_lock(lock: InitLock, init: F) -> Self {
        Self {
            value: AtomicPtr::new(null_mut()),
            init: UnsafeCell::new(Some(init)),
            lock: LockDomain::Shared(lock),
            _phantom: PhantomData,
        }
    }

    /// Returns the shared mutual-exclusion domain of this binding, or None if
    /// the binding uses a private lock.
    #[inline(always)]
    pub fn lock(&self) -> Option<&InitLock> {
        self.lock.shared()
    }

    /// Overwrites the value of this binding and drops the initializer.
    ///
    /// The function holds the binding's lock while writing.
    pub fn write(&mut self, value: T) {
        let value = Box::into_raw(Box::new(value));

        let previous = {
            let _guard = self.lock.acquire();

            // Safety: The initializer is accessed under the lock.
            unsafe { *self.init.get() = None };

            self.value.swap(value, Ordering::AcqRel)
        };

        trace_event!(mode = "locked", "LazyVar value written.");

        if !previous.is_null() {
            // Safety:
            //   1. Non-null pointer is a valid data leaked from the Box
            //      owned by this binding.
            //   2. There are no outstanding references to the previous value
            //      because the binding is borrowed mutably.
            let _ = unsafe { Box::from_raw(previous) };
        }
    }

    /// Returns a reference to the value if the binding has been initialized.
    ///
    /// This function never blocks.
    #[inline(always)]
    pub fn get(&self) -> Option<&T> {
        let value = self.value.load(Ordering::Acquire);

        // Safety:
        //   1. Non-null pointer is a valid data leaked from the Box.
        //   2. The data is released only under exclusive access.
        unsafe { value.as_ref() }
    }

    /// Returns a mutable reference to the value if the binding has been
    /// initialized.
    #[inline(always)]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let value = *self.value.get_mut();

        // Safety:
        //   1. Non-null pointer is a valid data leaked from the Box.
        //   2. The binding is borrowed mutably.
        unsafe { value.as_mut() }
    }

    /// Returns true if the binding has been initialized.
    ///
    /// This function never blocks.
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        !self.value.load(Ordering::Acquire).is_null()
    }

    fn init_with<E>(&self, call: impl FnOnce(&mut F) -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let _guard = self.lock.acquire();

        if let Some(value) = self.get() {
            return Ok(value);
        }

        // Safety: The initializer is accessed under the lock.
        let init = unsafe { &mut *self.init.get() };

        let Some(function) = init.as_mut() else {
            system_panic!("SyncLazyVar initializer is missing in uninitialized binding.");
            unreachable!();
        };

        trace_event!(mode = "locked", "LazyVar initializer invoked.");

        let value = match call(function) {
            Ok(value) => Box::into_raw(Box::new(value)),

            Err(error) => {
                trace_event!(mode = "locked", "LazyVar initialization failed.");
                return Err(error);
            }
        };

        self.value.store(value, Ordering::Release);

        *init = None;

        // Safety:
        //   1. The pointer is a valid data leaked from the Box.
        //   2. The data is released only under exclusive access.
        Ok(unsafe { &*value })
    }
}
