//! Constants and configuration defaults for the radix tree

pub const PARAM_MARKER: u8 = b':';
pub const CATCH_ALL_MARKER: u8 = b'*';
pub const SEPARATOR: u8 = b'/';

/// Parameter slots reserved per lookup before the tree has seen any wildcard.
pub const DEFAULT_PARAM_CAPACITY: usize = 4;

pub const METRIC_ROUTES_TOTAL: &str = "radixroute_routes_total";
pub const METRIC_ROUTE_ERRORS_TOTAL: &str = "radixroute_route_errors_total";
pub const METRIC_LOOKUPS_TOTAL: &str = "radixroute_lookups_total";
pub const METRIC_LOOKUP_MISSES_TOTAL: &str = "radixroute_lookup_misses_total";
pub const METRIC_ROUTES: &str = "radixroute_routes";
