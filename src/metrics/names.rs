//! Counter names.
//!
//! Names follow `cmd_<command>[_<outcome>][_<tier>]`. Unsuffixed outcome
//! counters aggregate across tiers.

// =============================================================================
// Set
// =============================================================================

pub const CMD_SET: &str = "cmd_set";
pub const CMD_SET_L1: &str = "cmd_set_L1";
pub const CMD_SET_L2: &str = "cmd_set_L2";
pub const CMD_SET_SUCCESS: &str = "cmd_set_success";
pub const CMD_SET_SUCCESS_L1: &str = "cmd_set_success_L1";
pub const CMD_SET_SUCCESS_L2: &str = "cmd_set_success_L2";
pub const CMD_SET_ERRORS: &str = "cmd_set_errors";
pub const CMD_SET_ERRORS_L1: &str = "cmd_set_errors_L1";
pub const CMD_SET_ERRORS_L2: &str = "cmd_set_errors_L2";

// =============================================================================
// Add
// =============================================================================

pub const CMD_ADD: &str = "cmd_add";
pub const CMD_ADD_L1: &str = "cmd_add_L1";
pub const CMD_ADD_L2: &str = "cmd_add_L2";
pub const CMD_ADD_STORED: &str = "cmd_add_stored";
pub const CMD_ADD_STORED_L1: &str = "cmd_add_stored_L1";
pub const CMD_ADD_STORED_L2: &str = "cmd_add_stored_L2";
pub const CMD_ADD_NOT_STORED: &str = "cmd_add_notstored";
pub const CMD_ADD_NOT_STORED_L1: &str = "cmd_add_notstored_L1";
pub const CMD_ADD_NOT_STORED_L2: &str = "cmd_add_notstored_L2";
pub const CMD_ADD_ERRORS: &str = "cmd_add_errors";
pub const CMD_ADD_ERRORS_L1: &str = "cmd_add_errors_L1";
pub const CMD_ADD_ERRORS_L2: &str = "cmd_add_errors_L2";

// =============================================================================
// Replace
// =============================================================================

pub const CMD_REPLACE: &str = "cmd_replace";
pub const CMD_REPLACE_L1: &str = "cmd_replace_L1";
pub const CMD_REPLACE_L2: &str = "cmd_replace_L2";
pub const CMD_REPLACE_STORED: &str = "cmd_replace_stored";
pub const CMD_REPLACE_STORED_L1: &str = "cmd_replace_stored_L1";
pub const CMD_REPLACE_STORED_L2: &str = "cmd_replace_stored_L2";
pub const CMD_REPLACE_NOT_STORED: &str = "cmd_replace_notstored";
pub const CMD_REPLACE_NOT_STORED_L1: &str = "cmd_replace_notstored_L1";
pub const CMD_REPLACE_NOT_STORED_L2: &str = "cmd_replace_notstored_L2";
pub const CMD_REPLACE_ERRORS: &str = "cmd_replace_errors";
pub const CMD_REPLACE_ERRORS_L1: &str = "cmd_replace_errors_L1";
pub const CMD_REPLACE_ERRORS_L2: &str = "cmd_replace_errors_L2";

// =============================================================================
// Delete
// =============================================================================

pub const CMD_DELETE: &str = "cmd_delete";
pub const CMD_DELETE_L1: &str = "cmd_delete_L1";
pub const CMD_DELETE_L2: &str = "cmd_delete_L2";
pub const CMD_DELETE_HITS: &str = "cmd_delete_hits";
pub const CMD_DELETE_HITS_L1: &str = "cmd_delete_hits_L1";
pub const CMD_DELETE_HITS_L2: &str = "cmd_delete_hits_L2";
pub const CMD_DELETE_MISSES: &str = "cmd_delete_misses";
pub const CMD_DELETE_MISSES_L1: &str = "cmd_delete_misses_L1";
pub const CMD_DELETE_MISSES_L2: &str = "cmd_delete_misses_L2";
pub const CMD_DELETE_ERRORS: &str = "cmd_delete_errors";
pub const CMD_DELETE_ERRORS_L1: &str = "cmd_delete_errors_L1";
pub const CMD_DELETE_ERRORS_L2: &str = "cmd_delete_errors_L2";

// =============================================================================
// Touch
// =============================================================================

pub const CMD_TOUCH: &str = "cmd_touch";
pub const CMD_TOUCH_L1: &str = "cmd_touch_L1";
pub const CMD_TOUCH_HITS: &str = "cmd_touch_hits";
pub const CMD_TOUCH_HITS_L1: &str = "cmd_touch_hits_L1";
pub const CMD_TOUCH_MISSES: &str = "cmd_touch_misses";
pub const CMD_TOUCH_MISSES_L1: &str = "cmd_touch_misses_L1";

// =============================================================================
// Get
// =============================================================================

pub const CMD_GET: &str = "cmd_get";
pub const CMD_GET_KEYS: &str = "cmd_get_keys";
pub const CMD_GET_L1: &str = "cmd_get_L1";
pub const CMD_GET_KEYS_L1: &str = "cmd_get_keys_L1";
pub const CMD_GET_HITS: &str = "cmd_get_hits";
pub const CMD_GET_HITS_L1: &str = "cmd_get_hits_L1";
pub const CMD_GET_MISSES: &str = "cmd_get_misses";
pub const CMD_GET_MISSES_L1: &str = "cmd_get_misses_L1";
pub const CMD_GET_ERRORS: &str = "cmd_get_errors";
pub const CMD_GET_ERRORS_L1: &str = "cmd_get_errors_L1";

// =============================================================================
// Get-and-touch
// =============================================================================

pub const CMD_GAT: &str = "cmd_gat";
pub const CMD_GAT_L1: &str = "cmd_gat_L1";
pub const CMD_GAT_HITS: &str = "cmd_gat_hits";
pub const CMD_GAT_HITS_L1: &str = "cmd_gat_hits_L1";
pub const CMD_GAT_MISSES: &str = "cmd_gat_misses";
pub const CMD_GAT_MISSES_L1: &str = "cmd_gat_misses_L1";
pub const CMD_GAT_ERRORS: &str = "cmd_gat_errors";
pub const CMD_GAT_ERRORS_L1: &str = "cmd_gat_errors_L1";

// =============================================================================
// Housekeeping
// =============================================================================

pub const CMD_NOOP: &str = "cmd_noop";
pub const CMD_QUIT: &str = "cmd_quit";
pub const CMD_VERSION: &str = "cmd_version";
pub const CMD_UNKNOWN: &str = "cmd_unknown";

/// Every counter name, in declaration order.
pub const ALL: &[&str] = &[
    CMD_SET,
    CMD_SET_L1,
    CMD_SET_L2,
    CMD_SET_SUCCESS,
    CMD_SET_SUCCESS_L1,
    CMD_SET_SUCCESS_L2,
    CMD_SET_ERRORS,
    CMD_SET_ERRORS_L1,
    CMD_SET_ERRORS_L2,
    CMD_ADD,
    CMD_ADD_L1,
    CMD_ADD_L2,
    CMD_ADD_STORED,
    CMD_ADD_STORED_L1,
    CMD_ADD_STORED_L2,
    CMD_ADD_NOT_STORED,
    CMD_ADD_NOT_STORED_L1,
    CMD_ADD_NOT_STORED_L2,
    CMD_ADD_ERRORS,
    CMD_ADD_ERRORS_L1,
    CMD_ADD_ERRORS_L2,
    CMD_REPLACE,
    CMD_REPLACE_L1,
    CMD_REPLACE_L2,
    CMD_REPLACE_STORED,
    CMD_REPLACE_STORED_L1,
    CMD_REPLACE_STORED_L2,
    CMD_REPLACE_NOT_STORED,
    CMD_REPLACE_NOT_STORED_L1,
    CMD_REPLACE_NOT_STORED_L2,
    CMD_REPLACE_ERRORS,
    CMD_REPLACE_ERRORS_L1,
    CMD_REPLACE_ERRORS_L2,
    CMD_DELETE,
    CMD_DELETE_L1,
    CMD_DELETE_L2,
    CMD_DELETE_HITS,
    CMD_DELETE_HITS_L1,
    CMD_DELETE_HITS_L2,
    CMD_DELETE_MISSES,
    CMD_DELETE_MISSES_L1,
    CMD_DELETE_MISSES_L2,
    CMD_DELETE_ERRORS,
    CMD_DELETE_ERRORS_L1,
    CMD_DELETE_ERRORS_L2,
    CMD_TOUCH,
    CMD_TOUCH_L1,
    CMD_TOUCH_HITS,
    CMD_TOUCH_HITS_L1,
    CMD_TOUCH_MISSES,
    CMD_TOUCH_MISSES_L1,
    CMD_GET,
    CMD_GET_KEYS,
    CMD_GET_L1,
    CMD_GET_KEYS_L1,
    CMD_GET_HITS,
    CMD_GET_HITS_L1,
    CMD_GET_MISSES,
    CMD_GET_MISSES_L1,
    CMD_GET_ERRORS,
    CMD_GET_ERRORS_L1,
    CMD_GAT,
    CMD_GAT_L1,
    CMD_GAT_HITS,
    CMD_GAT_HITS_L1,
    CMD_GAT_MISSES,
    CMD_GAT_MISSES_L1,
    CMD_GAT_ERRORS,
    CMD_GAT_ERRORS_L1,
    CMD_NOOP,
    CMD_QUIT,
    CMD_VERSION,
    CMD_UNKNOWN,
];
