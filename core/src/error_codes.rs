//! Stable error codes embedded in error messages and returned by `code()` accessors.

pub const HEADER_NO_ROWS: &str = "TDIFF_HDR_001";
pub const HEADER_ROWS_UNAVAILABLE: &str = "TDIFF_HDR_002";
pub const HEADER_EMPTY_COLUMN: &str = "TDIFF_HDR_003";

pub const DATASET_ROW_WIDTH: &str = "TDIFF_DATA_001";
pub const DATASET_DUPLICATE_COLUMN: &str = "TDIFF_DATA_002";

pub const CONFIG_NO_KEY_COLUMNS: &str = "TDIFF_CFG_001";
pub const CONFIG_BLANK_COLUMN: &str = "TDIFF_CFG_002";
pub const CONFIG_REPEATED_KEY_COLUMN: &str = "TDIFF_CFG_003";
pub const CONFIG_KEY_COLUMN_IGNORED: &str = "TDIFF_CFG_004";
pub const CONFIG_INVALID_TOLERANCE: &str = "TDIFF_CFG_005";

pub const DIFF_MISSING_KEY_COLUMN: &str = "TDIFF_DIFF_001";
pub const DIFF_DUPLICATE_KEY: &str = "TDIFF_DIFF_002";
