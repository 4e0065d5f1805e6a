//! Utility modules

pub mod debug;
pub mod image;

pub use self::debug::DebugWriter;
pub use self::image::ImageUtils;
