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

mod lock;
mod locked;
mod race;

pub use crate::sync::{lock::InitLock, locked::SyncLazyVar, race::RaceLazyVar};
