//! Resource definitions: one module per manageable StatusCake entity.

pub mod contact_group;
pub mod heartbeat_check;
pub mod maintenance_window;
pub mod pagespeed_check;
pub mod ssl_check;
pub mod uptime_check;
