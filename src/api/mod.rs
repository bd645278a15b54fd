pub mod handlers;
pub mod selector;
pub mod types;

pub use handlers::*;
