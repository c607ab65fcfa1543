pub mod shader;
pub mod mesh;
pub mod texture;

use crate::error::{Error, Result};

pub type ResourcePath = std::path::PathBuf;
pub type ResourcePathRef = std::path::Path;

pub use self::shader::{ShaderProgram, ShaderStage, UniformValue};
pub use self::mesh::{BufferUsage, ComponentType, MeshBuffer, VertexAttribute, VertexLayout};
pub use self::texture::{AddressingMode, DecodedImage, FilterMode, PixelFormat, Texture2D, TextureParams};


/// Overrides the default `resource` directory.
pub const RESOURCE_DIR_ENV: &str = "GL_TUTORIALS_RESOURCE_DIR";


/// Resolves resource paths against a root directory and decodes files found there.
#[derive(Debug)]
pub struct ResourceManager {
	resource_root_path: ResourcePath,
}

impl ResourceManager {
	pub fn new() -> Result<Self> {
		let resource_root_path = std::env::var_os(RESOURCE_DIR_ENV)
			.map(ResourcePath::from)
			.unwrap_or_else(|| ResourcePath::from("resource"));

		Self::with_root(resource_root_path)
	}

	pub fn with_root(resource_root_path: impl Into<ResourcePath>) -> Result<Self> {
		let resource_root_path = resource_root_path.into();

		if !resource_root_path.is_dir() {
			return Err(Error::Resource(format!("Couldn't find resource path '{}'", resource_root_path.display())))
		}

		log::debug!("Resource root: {}", resource_root_path.display());

		Ok(Self{ resource_root_path })
	}

	pub fn resolve_path(&self, path: &ResourcePathRef) -> ResourcePath {
		self.resource_root_path.join(path)
	}

	/// Decodes an image file into tightly packed RGBA8, bottom row first to match GL texture coordinates.
	pub fn load_image(&self, path: &ResourcePathRef) -> Result<DecodedImage> {
		let full_path = self.resolve_path(path);

		let image = image::open(&full_path)
			.map_err(|err| Error::Decode(format!("'{}': {err}", full_path.display())))?
			.flipv()
			.into_rgba8();

		let (width, height) = image.dimensions();
		let pixels = image.into_raw();

		if pixels.is_empty() {
			return Err(Error::Decode(format!("'{}' contains no pixel data", full_path.display())))
		}

		log::debug!("Decoded '{}' ({width}x{height})", full_path.display());

		Ok(DecodedImage {
			width,
			height,
			format: PixelFormat::Rgba8,
			pixels,
		})
	}
}


pub(crate) fn label_object(identifier: u32, name: u32, label: &str) {
	unsafe {
		gl::ObjectLabel(identifier, name, label.len() as i32, label.as_ptr() as *const _);
	}
}
