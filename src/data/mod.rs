//! Remote evaluator integration.
//!
//! - request/response wire types and unit conversion (`wire`)
//! - HTTP transport seam (`transport`)
//! - 429 backoff loop (`retry`)
//! - row assembly with the local tax fallback (`evaluate`)

pub mod evaluate;
pub mod retry;
pub mod transport;
pub mod wire;

pub use evaluate::{EvaluatedRow, TaxSource, assemble_row, evaluate_salary};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper, post_with_retry};
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use wire::{EvaluateRequest, EvaluateResponse, to_annual};
