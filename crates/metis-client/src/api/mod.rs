//! API endpoint implementations.

mod chat;
mod credit;
mod meta;
mod storage;
mod wrapper;

pub use chat::ChatApi;
pub use credit::CreditApi;
pub use meta::MetaApi;
pub use storage::StorageApi;
pub use wrapper::WrapperApi;
