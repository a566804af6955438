pub mod board;
pub mod queue;

pub use board::{QueueBoard, QueueDialog};
pub use queue::QueueService;
