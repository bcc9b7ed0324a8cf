mod in_memory;
mod redis;

pub use in_memory::InMemoryCheckpointStore;
pub use redis::RedisCheckpointStore;
