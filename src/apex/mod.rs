pub mod endpoints;
pub mod utils;
