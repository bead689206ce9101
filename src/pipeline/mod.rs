mod core;

pub use core::{HandlerRequest, HandlerResponse, HeaderVec, Pipeline, MAX_INLINE_HEADERS};
