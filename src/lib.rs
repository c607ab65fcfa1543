//! Window + GL context bootstrap, shader/mesh/texture wrappers and a render loop,
//! shared by the tutorial programs in `src/bin`.

pub mod context;
pub mod error;
pub mod logging;
pub mod main_loop;
pub mod resource_manager;

pub use context::{ContextDef, ContextHost, GlContext, HostWindow, Key, Surface};
pub use error::{Error, Result};
pub use main_loop::{ClearPass, DrawPass, FrameInfo, LoopDef, LoopReport, LoopState, MainLoop, PrimitiveType, RenderLoop};
pub use resource_manager::*;
