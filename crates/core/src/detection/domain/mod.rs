pub mod bus_detector;
pub mod detection;
