//! Stream utilities for the capture loop

mod aligned;

pub use aligned::{AlignedTicks, aligned_delay, delay_until_next_tick};
