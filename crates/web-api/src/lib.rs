pub mod handlers;
pub mod server;

pub use server::{ApiContext, ApiServer};
