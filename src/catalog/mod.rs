pub mod delegates;
pub mod schemas;
