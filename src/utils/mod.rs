pub mod calendar;
pub mod clock;
pub mod db_utils;
pub mod login_id_cache;
pub mod login_id_filter;
pub mod records;
