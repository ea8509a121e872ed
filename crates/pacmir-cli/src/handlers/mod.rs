pub mod add;
pub mod list;
pub mod remove;
pub mod sync;

pub use add::AddHandler;
pub use list::ListHandler;
pub use remove::RemoveHandler;
pub use sync::SyncHandler;
