pub mod branch_cache;
pub mod clock;
pub mod employee_filter;
pub mod geofence;
