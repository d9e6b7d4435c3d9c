/// Channel id assigned to files without a `_C` channel marker.
pub const SINGLE_CHANNEL_ID: &str = "SINGLECHANNEL";

/// Marker preceding the channel token in per-channel file names.
pub const CHANNEL_MARKER: &str = "_C";

/// Display colour used for channels missing from the colour map.
pub const DEFAULT_DISPLAY_COLOR: &str = "gray";

/// Channel exempted from contrast enhancement by default (cell-wall stain).
pub const DEFAULT_SATURATED_CHANNEL: &str = "C01";

/// Stabilizer added to the min-max denominator so constant images do not divide by zero.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Default normalized CLAHE clip limit (fraction of tile pixels per bin).
pub const DEFAULT_CLAHE_CLIP_LIMIT: f64 = 0.01;

/// Default number of CLAHE histogram bins.
pub const DEFAULT_CLAHE_BINS: usize = 256;

/// Default CLAHE tile size as a fraction of the plane: 1/8 of each dimension.
pub const DEFAULT_CLAHE_KERNEL_DIVISOR: usize = 8;

/// Minimum plane count before CLAHE planes are equalized in parallel.
pub const PARALLEL_PLANE_THRESHOLD: usize = 2;

/// Suffix appended to every normalized output image stem.
pub const NORMALIZED_SUFFIX: &str = "normalized";

/// Extension of written images.
pub const OUTPUT_EXTENSION: &str = "tiff";

/// Extension of per-group metadata artifacts.
pub const METADATA_EXTENSION: &str = "json";
