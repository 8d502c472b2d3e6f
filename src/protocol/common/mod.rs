pub mod hex;
pub mod thread_id;
