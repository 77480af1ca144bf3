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
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A mutual-exclusion domain of the [SyncLazyVar](crate::sync::SyncLazyVar)
/// initialization.
///
/// By default, each SyncLazyVar initializes its value under its own private
/// lock. If you want several bindings to initialize their values
/// sequentially (for example, because their initializers touch the same
/// non-thread-safe resource), create one InitLock and pass its clones into
/// the [with_lock](crate::sync::SyncLazyVar::with_lock) constructor of each
/// binding.
///
/// All clones of InitLock refer to the same domain. The equality and the hash
/// of the InitLock objects are defined by the domain identity rather than
/// the content.
///
/// The initializers of the bindings within the same domain must not read
/// each other's uninitialized bindings, because this would lead to a
/// deadlock.
#[derive(Clone, Default)]
pub struct InitLock {
    inner: Arc<Mutex<()>>,
}

impl Debug for InitLock {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("InitLock({:#x})", self.addr()))
    }
}

impl PartialEq for InitLock {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.addr().eq(&other.addr())
    }
}

impl Eq for InitLock {}

impl Hash for InitLock {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl InitLock {
    /// Creates a new mutual-exclusion domain.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the address of the domain's allocation.
    #[inline(always)]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    #[inline(always)]
    fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// The lock that a SyncLazyVar holds while initializing or writing its value.
//
// A panicking initializer poisons the mutex, but the guarded data is a unit,
// and the binding's state is untouched by a failed initialization, so the
// poison flag is ignored.
pub(super) enum LockDomain {
    Private(Mutex<()>),
    Shared(InitLock),
}

impl LockDomain {
    #[inline(always)]
    pub(super) const fn private() -> Self {
        Self::Private(Mutex::new(()))
    }

    #[inline(always)]
    pub(super) fn acquire(&self) -> MutexGuard<'_, ()> {
        match self {
            Self::Private(mutex) => mutex.lock().unwrap_or_else(PoisonError::into_inner),
            Self::Shared(lock) => lock.acquire(),
        }
    }

    #[inline(always)]
    pub(super) fn shared(&self) -> Option<&InitLock> {
        match self {
            Self::Private(_) => None,
            Self::Shared(lock) => Some(lock),
        }
    }
}
