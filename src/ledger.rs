// ledger.rs splits the pool, the epoch handler and batch ordering into submodules.
pub mod handler;
pub mod policy;
pub mod pool;

pub use handler::*;
pub use policy::*;
pub use pool::*;
