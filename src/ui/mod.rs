//! Rendering and input handling.
//!
//! - **surface**: raster surface abstraction + console implementation
//! - **renderer**: per-frame grid painter with the blinking input bar
//! - **input**: key events -> pending command line -> session submit

pub mod input;
pub mod renderer;
pub mod surface;

pub use input::InputRouter;
pub use renderer::Renderer;
pub use surface::{ConsoleSurface, Surface};
