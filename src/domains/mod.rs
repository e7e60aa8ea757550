pub mod attachment;
pub mod core;
pub mod export;
pub mod import;
pub mod permission;
pub mod record;
pub mod select;
