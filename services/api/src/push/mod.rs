pub mod dispatcher;
pub mod registry;

pub use dispatcher::PushDispatcher;
pub use registry::{ConnectionRegistry, LiveConnection};
