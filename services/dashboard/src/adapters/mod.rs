pub mod api;
pub mod convert;
pub mod db;
pub mod http;
pub mod store;

pub use api::ApiAdapter;
pub use db::DbAdapter;
pub use store::{DocumentStore, MongoStore};
