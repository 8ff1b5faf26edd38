pub mod constants;
pub mod frame;
pub mod source_info;
