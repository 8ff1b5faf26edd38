pub mod frame_slot;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod watch_use_case;
