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
    convert::Infallible,
    fmt::{Debug, Display, Formatter},
    marker::PhantomData,
    ptr::null_mut,
    sync::{
        atomic::{AtomicPtr, Ordering},
        Arc,
        Mutex,
        PoisonError,
    },
};

use crate::{
    lazy::{fmt_described, LazyMode, LazyVar},
    report::{lv_assert, trace_event},
};

/// A thread-safe lazily-initialized binding that publishes the first
/// computed value.
///
/// This object implements the [Publication](LazyMode::Publication) strategy.
/// The binding never blocks a reader for the time of the initializer call:
/// when several threads read the uninitialized binding concurrently, each of
/// them calls the initializer on its own, and then tries to publish
/// the computed value with an atomic compare-and-set operation. The first
/// thread that succeeds becomes the winner, and its value becomes the value
/// of the binding. The other threads drop their values and return the
/// winner's value instead.
///
/// Therefore, the initializer could be called more than once, but all
/// readers observe the same value. This strategy suits the initializers that
/// are cheap and free of observable side effects.
///
/// ```
/// use lazyvar::sync::RaceLazyVar;
///
/// let binding = RaceLazyVar::new(|| vec![1, 2, 3]);
///
/// std::thread::scope(|scope| {
///     for _ in 0..4 {
///         scope.spawn(|| assert_eq!(binding.read(), &[1, 2, 3]));
///     }
/// });
///
/// assert!(binding.is_initialized());
/// ```
///
/// The winner drops the initializer right after the publication. The
/// initializer is held by a reference-counting handle, such that the
/// threads that are still running their redundant computations keep it
/// alive until they finish.
pub struct RaceLazyVar<T, F = fn() -> T> {
    value: AtomicPtr<T>,
    init: Mutex<Option<Arc<F>>>,
    _phantom: PhantomData<Box<T>>,
}

// Safety:
//   1. The value is published by the compare-and-set operation with
//      the Release ordering, and observed by the Acquire loads.
//   2. The losing threads drop only their own values.
//   3. The initializer is shared between threads by reference.
unsafe impl<T: Send + Sync, F: Send + Sync> Sync for RaceLazyVar<T, F> {}

// Safety: RaceLazyVar owns the boxed value and the initializer.
unsafe impl<T: Send, F: Send + Sync> Send for RaceLazyVar<T, F> {}

impl<T: Debug, F> Debug for RaceLazyVar<T, F> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(value) => formatter.debug_tuple("RaceLazyVar").field(value).finish(),
            None => formatter.write_str("RaceLazyVar(<uninit>)"),
        }
    }
}

impl<T: Display, F> Display for RaceLazyVar<T, F> {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        fmt_described(self.get(), formatter)
    }
}

impl<T, F> Drop for RaceLazyVar<T, F> {
    fn drop(&mut self) {
        let value = *self.value.get_mut();

        if !value.is_null() {
            // Safety: Non-null pointer is a valid data leaked from the Box
            //         owned by this binding.
            let _ = unsafe { Box::from_raw(value) };
        }
    }
}

impl<T, F: Fn() -> T> LazyVar<T> for RaceLazyVar<T, F> {
    #[inline(always)]
    fn read(&self) -> &T {
        RaceLazyVar::read(self)
    }

    #[inline(always)]
    fn write(&mut self, value: T) {
        RaceLazyVar::write(self, value)
    }

    #[inline(always)]
    fn get(&self) -> Option<&T> {
        RaceLazyVar::get(self)
    }

    #[inline(always)]
    fn is_initialized(&self) -> bool {
        RaceLazyVar::is_initialized(self)
    }

    #[inline(always)]
    fn mode(&self) -> LazyMode {
        LazyMode::Publication
    }
}

impl<T, F: Fn() -> T> RaceLazyVar<T, F> {
    /// Returns a reference to the value, calling the initializer first if
    /// the binding is not initialized yet.
    ///
    /// The initializer may run concurrently in several threads, but this
    /// function returns the value published by the first finished thread.
    ///
    /// If the initializer panics, the binding remains uninitialized.
    #[inline]
    pub fn read(&self) -> &T {
        match self.init_with(|init| Ok::<T, Infallible>(init())) {
            Ok(value) => value,
            Err(error) => match error {},
        }
    }
}

impl<T, E, F: Fn() -> Result<T, E>> RaceLazyVar<T, F> {
    /// Returns a reference to the value, calling the fallible initializer
    /// first if the binding is not initialized yet.
    ///
    /// If the initializer returns an error, this function returns this error
    /// as is, and does not publish anything. The next call to this function
    /// would call the initializer again, unless another thread publishes
    /// the value in between.
    #[inline]
    pub fn try_read(&self) -> Result<&T, E> {
        self.init_with(|init| init())
    }
}

impl<T, F> RaceLazyVar<T, F> {
    /// Creates a new uninitialized binding with the `init` initializer
    /// function.
    #[inline(always)]
    pub fn new(init: F) -> Self {
        Self {
            value: AtomicPtr::new(null_mut()),
            init: Mutex::new(Some(Arc::new(init))),
            _phantom: PhantomData,
        }
    }

    /// Overwrites the value of this binding and drops the initializer.
    pub fn write(&mut self, value: T) {
        let value = Box::into_raw(Box::new(value));

        let previous = {
            *self.init.get_mut().unwrap_or_else(PoisonError::into_inner) = None;

            self.value.swap(value, Ordering::AcqRel)
        };

        trace_event!(mode = "publication", "LazyVar value written.");

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
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        !self.value.load(Ordering::Acquire).is_null()
    }

    fn init_with<E>(&self, call: impl FnOnce(&F) -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let init = self
            .init
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        // The initializer is released only after the value publication.
        let Some(init) = init else {
            let value = self.value.load(Ordering::Acquire);

            lv_assert!(!value.is_null(), "RaceLazyVar initializer released too early.");

            // Safety:
            //   1. The pointer is a valid data leaked from the Box.
            //   2. The data is released only under exclusive access.
            return Ok(unsafe { &*value });
        };

        trace_event!(mode = "publication", "LazyVar initializer invoked.");

        let value = match call(&*init) {
            Ok(value) => Box::into_raw(Box::new(value)),

            Err(error) => {
                trace_event!(mode = "publication", "LazyVar initialization failed.");
                return Err(error);
            }
        };

        drop(init);

        match self
            .value
            .compare_exchange(null_mut(), value, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                *self.init.lock().unwrap_or_else(PoisonError::into_inner) = None;

                // Safety:
                //   1. The pointer is a valid data leaked from the Box.
                //   2. The data is released only under exclusive access.
                Ok(unsafe { &*value })
            }

            Err(published) => {
                trace_event!(mode = "publication", "LazyVar publication race lost.");

                // Safety: The value has not been shared with other threads.
                let _ = unsafe { Box::from_raw(value) };

                // Safety:
                //   1. The pointer is a valid data leaked from the Box.
                //   2. The data is released only under exclusive access.
                Ok(unsafe { &*published })
            }
        }
    }
}
