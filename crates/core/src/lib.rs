pub mod announce;
pub mod capture;
pub mod detection;
pub mod pipeline;
pub mod present;
pub mod shared;
