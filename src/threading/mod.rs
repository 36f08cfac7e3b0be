pub mod result_queue;
pub mod thread_pool;

pub use result_queue::ResultQueue;
pub use thread_pool::ThreadPool;
