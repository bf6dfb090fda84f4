pub mod attendance;
pub mod lateness;
pub mod location;
pub mod report;
pub mod shift;
pub mod staff;
