//! Application error type.
//!
//! Every fallible operation returns `AppError`, which carries the process exit
//! code alongside a human-readable message:
//!
//! - `2`: configuration / filesystem I/O
//! - `3`: data errors (empty or unusable table)
//! - `4`: remote evaluator failures
//! - `5`: chart rendering

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATA: u8 = 3;
pub const EXIT_REMOTE: u8 = 4;
pub const EXIT_PLOT: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(EXIT_REMOTE, message)
    }

    pub fn plot(message: impl Into<String>) -> Self {
        Self::new(EXIT_PLOT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
