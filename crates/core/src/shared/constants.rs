/// Default model artifact name, looked up in the cache and bundled
/// directories by the resolver.
pub const MODEL_NAME: &str = "busdetect.onnx";

/// Default newline-delimited class-name list.
pub const LABELS_NAME: &str = "labels.txt";

/// Class names that trigger a spoken announcement.
pub const BMTA_BUS: &str = "BMTA-bus";
pub const BUS_LINE_NUMBER: &str = "Bus Line Number";
pub const BUS_SIDE_NUMBER: &str = "Bus Side Number";
pub const DESTINATION_SIGN: &str = "Destination Sign";
pub const TSB_BUS: &str = "TSB-Bus";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
