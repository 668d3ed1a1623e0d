pub mod assets;
pub mod cli;
pub mod errors;
pub mod routes;

pub use routes::router;
