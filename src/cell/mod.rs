mod builder;
mod cell;
mod state;

pub use builder::CellBuilder;
pub use cell::OptimisticCell;
pub use state::OptimisticState;
