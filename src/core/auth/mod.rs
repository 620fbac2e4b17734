pub mod store;
pub mod types;

pub use store::AuthStore;
pub use types::Session;
