// Every handler here runs behind the access gate and reads the caller from
// the trusted identity header.
pub mod auth;
pub mod resources;
pub mod system;
