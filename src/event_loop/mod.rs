//! Cooperative event loop subsystem.
//!
//! # Data Flow
//! ```text
//! EventLoopHandle::post / post_after / spawn   (any thread)
//!     → unbounded queue
//!     → strand.rs dispatch loop (one thread, one event at a time)
//!
//! Shutdown::request / request_from_signal
//!     → observed at the next iteration boundary
//!     → queued events drained once, loop returns
//! ```
//!
//! # Design Decisions
//! - A current-thread Tokio runtime backs the loop, so timers and async
//!   completions only make progress while the strand is being driven
//! - `keep_alive` plays the role of a work guard: without it the loop
//!   returns once the queue is empty and no timers or tasks are outstanding
//! - Nothing in flight is preempted; cancellation is checked between events

pub mod handle;
pub mod strand;

pub use handle::EventLoopHandle;
pub use strand::{Event, EventLoop, LoopExit};
