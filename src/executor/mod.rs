//! Priority-ordered execution of asynchronous work.
//!
//! ```text
//!  submit(HIGH) ─┐
//!  submit(LOW)  ─┼─▶ BinaryHeap<(rank, seq)> ──pop──▶ worker ──▶ TaskHandle
//!  submit(MED)  ─┘        (parking_lot::Mutex)       (one at a time)
//! ```

mod priority;
mod queue;

pub use priority::TaskPriority;
pub use queue::{PriorityTaskExecutor, TaskHandle};
