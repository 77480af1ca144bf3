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

macro_rules! lv_assert {
    ($assertion:expr, $message:expr) => {
        #[cfg(debug_assertions)]
        {
            if !$assertion {
                $crate::report::system_panic!($message);
            }
        }
    };

    ($assertion:expr, $message:expr, $($args:tt)*) => {
        #[cfg(debug_assertions)]
        {
            if !$assertion {
                $crate::report::system_panic!($message, $($args)*);
            }
        }
    };
}

macro_rules! system_panic (
    ($message:expr) => {{
        if !::std::thread::panicking() {
            ::std::panic!(
                "{}",
                $crate::report::error_message!($message),
            );
        }
    }};

    ($message:expr, $($args:tt)*) => {
        $crate::report::system_panic!(::std::format!($message, $($args)*))
    };
);

macro_rules! error_message (
    ($message:expr) => {
        ::std::format!(
r#" !! LAZY VAR INTERNAL ERROR
 !!
 !! This is a bug.
 !! If you see this message, please open an Issue in the project's repository.
 !!
 !! Message: {}
 !! File: {}
 !! Line: {}
 !! Column: {}
"#,
            $message,
            ::std::file!(),
            ::std::line!(),
            ::std::column!(),
        )
    };

    ($message:expr, $($args:tt)*) => {
        $crate::report::error_message!(::std::format!($message, $($args)*))
    };
);

macro_rules! trace_event (
    ($($args:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            ::tracing::trace!(target: "lazyvar", $($args)*);
        }
    };
);

pub(crate) use error_message;
pub(crate) use lv_assert;
pub(crate) use system_panic;
pub(crate) use trace_event;
