pub mod backup;
pub mod command;
pub mod validate;
