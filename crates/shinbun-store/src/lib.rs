pub mod channels;
pub mod database;
pub mod error;
pub mod messages;
pub mod row_helpers;
pub mod schema;
pub mod sync_store;

pub use channels::ChannelRepo;
pub use database::Database;
pub use error::StoreError;
pub use messages::MessageRepo;
pub use sync_store::SqliteSyncStore;
