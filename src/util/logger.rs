#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        println!("\x1b[32m[INFO] [{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        println!("\x1b[33m[LOG]  [{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        println!("\x1b[35m[WARN] [{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        println!("\x1b[31m[ERROR][{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        panic!("\x1b[1;31m[FATAL][{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

/// Regime transitions get their own tag so they stand out in long tick logs.
#[macro_export]
macro_rules! regime {
    ($($arg:tt)*) => {
        println!("\x1b[1;34m[REGM] [{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if std::env::var("LOG_ENVELOPE_EVENTS").is_ok() {
            println!("\x1b[36m[EVENT][{}]\x1b[0m {}", $crate::chrono::Utc::now().format("%H:%M:%S"), format!($($arg)*))
        }
    };
}
