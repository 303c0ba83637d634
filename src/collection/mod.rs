mod builder;
mod collection;
mod list;
mod pending;

pub use builder::CollectionBuilder;
pub use collection::OptimisticCollection;
pub use list::OptimisticList;
