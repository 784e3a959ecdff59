//! casring - bounded lock-free MPMC ring buffer arbitrated by cursor CAS
//!
//! Any number of producers and consumers share one [`RingBuffer`] without a
//! lock. Each side claims a generation by a compare-and-swap on its own
//! monotonic cursor (`write` for producers, `read` for consumers); the winner
//! then publishes into, or clears, the slot at `cursor & (capacity - 1)`.
//!
//! ```
//! use casring::{PopError, RingBuffer};
//!
//! let ring = RingBuffer::new(4).unwrap();
//! ring.push("a").unwrap();
//! ring.push("b").unwrap();
//! assert_eq!(ring.pop(), Ok("a"));
//! assert_eq!(ring.pop(), Ok("b"));
//! assert_eq!(ring.pop(), Err(PopError::Empty));
//! ```
//!
//! Operations never block: they succeed, report full/empty, or spin briefly
//! (yielding after 16 spins) while another thread finishes the second half of
//! its own operation. Values are FIFO in the order cursor CASes are won.
//!
//! Cursors are `u64` and never wrap in practice; at 10^9 operations per
//! second a cursor takes over 580 years to overflow, and overflow is not
//! handled.
#![warn(missing_docs)]

mod error;
mod ring;
mod sync;
pub mod trace;

pub use error::{CapacityError, PopError, PushError};
pub use ring::RingBuffer;
