pub mod registry;
pub mod source;
pub mod validate;

pub use registry::RoutineRegistry;
pub use source::{NoUserStore, RoutineLoader, RoutineSource, UserContext, UserRoutineStore};
pub use validate::validate;
