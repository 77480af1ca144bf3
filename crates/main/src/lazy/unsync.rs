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
    cell::{Cell, OnceCell},
    convert::Infallible,
    fmt::{Debug, Display, Formatter},
};

use crate::{
    lazy::{fmt_described, LazyMode, LazyVar},
    report::trace_event,
};

/// A lazily-initialized binding without any synchronization.
///
/// This object implements the [Unsynchronized](LazyMode::Unsynchronized)
/// strategy: the first [read](Self::read) calls the initializer function in
/// place, stores the result, and drops the initializer.
///
/// UnsyncLazyVar is not [Sync], so it cannot be observed by several threads
/// at the same time. This is the cheapest binding, intended for
/// single-threaded code or for the data that is already guarded by an outer
/// synchronization primitive.
///
/// ```
/// use lazyvar::lazy::UnsyncLazyVar;
///
/// let mut title = UnsyncLazyVar::new(|| String::from("Untitled"));
///
/// assert_eq!(title.read(), "Untitled");
///
/// title.write(String::from("Chapter 1"));
///
/// assert_eq!(title.to_string(), "Chapter 1");
/// ```
///
/// The initializer must not read its own binding. Such a recursive read
/// panics.
pub struct UnsyncLazyVar<T, F = fn() -> T> {
    value: OnceCell<T>,
    init: Cell<Option<F>>,
}

impl<T: Debug, F> Debug for UnsyncLazyVar<T, F> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value.get() {
            Some(value) => formatter
                .debug_tuple("UnsyncLazyVar")
                .field(value)
                .finish(),
            None => formatter.write_str("UnsyncLazyVar(<uninit>)"),
        }
    }
}

impl<T: Display, F> Display for UnsyncLazyVar<T, F> {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        fmt_described(self.value.get(), formatter)
    }
}

impl<T, F: FnMut() -> T> LazyVar<T> for UnsyncLazyVar<T, F> {
    #[inline(always)]
    fn read(&self) -> &T {
        UnsyncLazyVar::read(self)
    }

    #[inline(always)]
    fn write(&mut self, value: T) {
        UnsyncLazyVar::write(self, value)
    }

    #[inline(always)]
    fn get(&self) -> Option<&T> {
        UnsyncLazyVar::get(self)
    }

    #[inline(always)]
    fn is_initialized(&self) -> bool {
        UnsyncLazyVar::is_initialized(self)
    }

    #[inline(always)]
    fn mode(&self) -> LazyMode {
        LazyMode::Unsynchronized
    }
}

impl<T, F: FnMut() -> T> UnsyncLazyVar<T, F> {
    /// Returns a reference to the value, calling the initializer first if
    /// the binding is not initialized yet.
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

impl<T, E, F: FnMut() -> Result<T, E>> UnsyncLazyVar<T, F> {
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

impl<T, F> UnsyncLazyVar<T, F> {
    /// Creates a new uninitialized binding with the `init` initializer
    /// function.
    #[inline(always)]
    pub const fn new(init: F) -> Self {
        Self {
            value: OnceCell::new(),
            init: Cell::new(Some(init)),
        }
    }

    /// Overwrites the value of this binding and drops the initializer.
    #[inline]
    pub fn write(&mut self, value: T) {
        trace_event!(mode = "unsynchronized", "LazyVar value written.");

        self.value = OnceCell::from(value);
        *self.init.get_mut() = None;
    }

    /// Returns a reference to the value if the binding has been initialized.
    #[inline(always)]
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Returns a mutable reference to the value if the binding has been
    /// initialized.
    #[inline(always)]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.get_mut()
    }

    /// Returns true if the binding has been initialized.
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }

    fn init_with<E>(&self, call: impl FnOnce(&mut F) -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let mut restore = Restore {
            cell: &self.init,
            init: self.init.take(),
        };

        let Some(init) = restore.init.as_mut() else {
            panic!("UnsyncLazyVar initializer reads its own binding.");
        };

        trace_event!(mode = "unsynchronized", "LazyVar initializer invoked.");

        let value = match call(init) {
            Ok(value) => value,

            Err(error) => {
                trace_event!(mode = "unsynchronized", "LazyVar initialization failed.");
                return Err(error);
            }
        };

        restore.init = None;

        Ok(self.value.get_or_init(move || value))
    }
}

// Puts the taken initializer back into the binding unless the initialization
// succeeded, including unwinding from a panicking initializer.
struct Restore<'a, F> {
    cell: &'a Cell<Option<F>>,
    init: Option<F>,
}

impl<'a, F> Drop for Restore<'a, F> {
    fn drop(&mut self) {
        if let Some(init) = self.init.take() {
            self.cell.set(Some(init));
        }
    }
}
