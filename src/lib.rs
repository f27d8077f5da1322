#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod errors;
pub mod render;
pub mod resources;
pub mod scene;

pub use assets::{Assets, GeometryHandle, MaterialHandle, TextureHandle};
pub use errors::{FableError, Result};
pub use render::backend::{HeadlessBackend, RenderBackend};
pub use render::{FrameStats, Renderer};
pub use resources::{BlendMode, Geometry, Material, Mesh, Texture};
pub use scene::{Camera, Node, NodeHandle, Scene, Transform};
