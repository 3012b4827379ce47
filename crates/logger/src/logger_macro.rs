#[macro_export]
macro_rules! log {
    ($handle:expr, $severity:expr, $($arg:tt)*) => {
        $handle.log($severity, format!($($arg)*), file!(), line!())
    };
}

#[macro_export]
macro_rules! hysterical {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log!($handle, $crate::Severity::Hysterical, $($arg)*)
    };
}

#[macro_export]
macro_rules! trace {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log!($handle, $crate::Severity::Trace, $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log!($handle, $crate::Severity::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log!($handle, $crate::Severity::Warning, $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log!($handle, $crate::Severity::Error, $($arg)*)
    };
}
