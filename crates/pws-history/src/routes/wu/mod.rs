pub mod history_routes;

pub use history_routes::*;
