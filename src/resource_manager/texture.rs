use crate::context::GlContext;
use crate::error::{Error, Result};


#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[repr(u32)]
pub enum AddressingMode {
	/// This is the default
	Repeat = gl::REPEAT,
	MirroredRepeat = gl::MIRRORED_REPEAT,
	ClampToEdge = gl::CLAMP_TO_EDGE,
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[repr(u32)]
pub enum FilterMode {
	Nearest = gl::NEAREST,
	Linear = gl::LINEAR,
	NearestMipmapNearest = gl::NEAREST_MIPMAP_NEAREST,
	LinearMipmapLinear = gl::LINEAR_MIPMAP_LINEAR,
}

impl FilterMode {
	pub fn uses_mipmaps(self) -> bool {
		matches!(self, FilterMode::NearestMipmapNearest | FilterMode::LinearMipmapLinear)
	}

	// Magnification never samples mip levels
	fn for_magnify(self) -> FilterMode {
		match self {
			FilterMode::Nearest | FilterMode::NearestMipmapNearest => FilterMode::Nearest,
			FilterMode::Linear | FilterMode::LinearMipmapLinear => FilterMode::Linear,
		}
	}
}


/// Sampling state, fixed when the texture is created.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct TextureParams {
	pub addressing_mode: AddressingMode,
	pub minify_filter: FilterMode,
	pub magnify_filter: FilterMode,
}

impl Default for TextureParams {
	fn default() -> TextureParams {
		TextureParams {
			addressing_mode: AddressingMode::Repeat,
			minify_filter: FilterMode::LinearMipmapLinear,
			magnify_filter: FilterMode::Linear,
		}
	}
}

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum PixelFormat {
	R8,
	Rg8,
	Rgb8,
	Rgba8,
}

impl PixelFormat {
	pub fn channels(self) -> usize {
		match self {
			PixelFormat::R8 => 1,
			PixelFormat::Rg8 => 2,
			PixelFormat::Rgb8 => 3,
			PixelFormat::Rgba8 => 4,
		}
	}

	fn internal_format(self) -> u32 {
		match self {
			PixelFormat::R8 => gl::R8,
			PixelFormat::Rg8 => gl::RG8,
			PixelFormat::Rgb8 => gl::RGB8,
			PixelFormat::Rgba8 => gl::RGBA8,
		}
	}

	fn upload_format(self) -> u32 {
		match self {
			PixelFormat::R8 => gl::RED,
			PixelFormat::Rg8 => gl::RG,
			PixelFormat::Rgb8 => gl::RGB,
			PixelFormat::Rgba8 => gl::RGBA,
		}
	}
}


/// Raw pixels straight out of the image decoder, rows bottom to top.
#[derive(Debug, Clone)]
pub struct DecodedImage {
	pub width: u32,
	pub height: u32,
	pub format: PixelFormat,
	pub pixels: Vec<u8>,
}



#[derive(Debug)]
pub struct Texture2D<'gl> {
	gl: &'gl GlContext,
	name: u32,
	width: u32,
	height: u32,
	format: PixelFormat,
	params: TextureParams,
}

impl<'gl> Texture2D<'gl> {
	pub fn load_from_pixels(gl: &'gl GlContext, width: u32, height: u32, pixels: &[u8], format: PixelFormat, params: TextureParams)
		-> Result<Self>
	{
		validate_pixels(width, height, pixels.len(), format)?;

		let max_size = gl.max_texture_size();
		if width > max_size || height > max_size {
			return Err(Error::Decode(format!("{width}x{height} exceeds the {max_size} texel limit")))
		}

		let levels = match params.minify_filter.uses_mipmaps() {
			true => mip_level_count(width, height),
			false => 1,
		};

		let mut name = 0;

		unsafe {
			gl::CreateTextures(gl::TEXTURE_2D, 1, &mut name);
			gl::TextureStorage2D(name, levels as i32, format.internal_format(), width as i32, height as i32);

			// Rows of RGB8 and narrower formats aren't 4-byte aligned in general
			gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);

			let (level, offset_x, offset_y) = (0, 0, 0);
			gl::TextureSubImage2D(name, level, offset_x, offset_y,
				width as i32, height as i32,
				format.upload_format(),
				gl::UNSIGNED_BYTE,
				pixels.as_ptr() as *const _);

			gl::PixelStorei(gl::UNPACK_ALIGNMENT, 4);

			gl::TextureParameteri(name, gl::TEXTURE_WRAP_S, params.addressing_mode as i32);
			gl::TextureParameteri(name, gl::TEXTURE_WRAP_T, params.addressing_mode as i32);
			gl::TextureParameteri(name, gl::TEXTURE_MIN_FILTER, params.minify_filter as i32);
			gl::TextureParameteri(name, gl::TEXTURE_MAG_FILTER, params.magnify_filter.for_magnify() as i32);

			if levels > 1 {
				gl::GenerateTextureMipmap(name);
			}
		}

		log::debug!("Created {width}x{height} {format:?} texture {name} with {levels} mip levels");

		Ok(Texture2D {
			gl,
			name,
			width,
			height,
			format,
			params,
		})
	}

	pub fn from_image(gl: &'gl GlContext, image: &DecodedImage, params: TextureParams) -> Result<Self> {
		Self::load_from_pixels(gl, image.width, image.height, &image.pixels, image.format, params)
	}

	pub fn with_label(self, label: &str) -> Self {
		super::label_object(gl::TEXTURE, self.name, label);
		self
	}

	pub fn bind_to_unit(&self, unit: u32) {
		self.gl.bind_texture_unit(unit, self.name);
	}

	pub fn size(&self) -> (u32, u32) {
		(self.width, self.height)
	}

	pub fn format(&self) -> PixelFormat {
		self.format
	}

	pub fn params(&self) -> &TextureParams {
		&self.params
	}
}

impl Drop for Texture2D<'_> {
	fn drop(&mut self) {
		log::trace!("Deleting texture {}", self.name);

		self.gl.forget_texture(self.name);
		unsafe {
			gl::DeleteTextures(1, &self.name);
		}
	}
}


fn validate_pixels(width: u32, height: u32, byte_len: usize, format: PixelFormat) -> Result<()> {
	if width == 0 || height == 0 {
		return Err(Error::Decode(format!("image has no area ({width}x{height})")))
	}

	if byte_len == 0 {
		return Err(Error::Decode(String::from("decoder returned no pixel data")))
	}

	// GL takes dimensions as GLsizei
	if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
		return Err(Error::Decode(format!("{width}x{height} is too large for a texture")))
	}

	let expected = (width as usize).checked_mul(height as usize)
		.and_then(|texels| texels.checked_mul(format.channels()))
		.ok_or_else(|| Error::Decode(format!("{width}x{height} {format:?} is too large to address")))?;

	if byte_len < expected {
		return Err(Error::Decode(format!("{width}x{height} {format:?} needs {expected} bytes, got {byte_len}")))
	}

	Ok(())
}

/// Levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
	32 - width.max(height).max(1).leading_zeros()
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_pixel_buffer_is_decode_failure() {
		assert!(matches!(validate_pixels(4, 4, 0, PixelFormat::Rgba8), Err(Error::Decode(_))));
	}

	#[test]
	fn short_pixel_buffer_is_decode_failure() {
		assert!(matches!(validate_pixels(2, 2, 15, PixelFormat::Rgba8), Err(Error::Decode(_))));
		assert!(validate_pixels(2, 2, 16, PixelFormat::Rgba8).is_ok());
		assert!(validate_pixels(3, 1, 9, PixelFormat::Rgb8).is_ok());
	}

	#[test]
	fn zero_sized_image_is_decode_failure() {
		assert!(validate_pixels(0, 8, 32, PixelFormat::R8).is_err());
		assert!(validate_pixels(8, 0, 32, PixelFormat::R8).is_err());
	}

	#[test]
	fn oversized_dimensions_are_decode_failures() {
		assert!(matches!(validate_pixels(u32::MAX, u32::MAX, 1, PixelFormat::Rgba8), Err(Error::Decode(_))));
		assert!(matches!(validate_pixels(1 << 31, 1, usize::MAX, PixelFormat::R8), Err(Error::Decode(_))));
		assert!(matches!(validate_pixels(1, 1 << 31, usize::MAX, PixelFormat::R8), Err(Error::Decode(_))));
	}

	#[test]
	fn mip_chain_lengths() {
		assert_eq!(mip_level_count(1, 1), 1);
		assert_eq!(mip_level_count(2, 1), 2);
		assert_eq!(mip_level_count(256, 128), 9);
		assert_eq!(mip_level_count(640, 480), 10);
	}

	#[test]
	fn default_params_match_textured_cube() {
		let params = TextureParams::default();
		assert_eq!(params.addressing_mode, AddressingMode::Repeat);
		assert!(params.minify_filter.uses_mipmaps());
		assert_eq!(params.magnify_filter, FilterMode::Linear);
	}

	#[test]
	fn magnify_filter_drops_mipmapping() {
		assert_eq!(FilterMode::LinearMipmapLinear.for_magnify(), FilterMode::Linear);
		assert_eq!(FilterMode::NearestMipmapNearest.for_magnify(), FilterMode::Nearest);
		assert_eq!(FilterMode::Nearest.for_magnify(), FilterMode::Nearest);
	}

	#[test]
	fn channel_counts() {
		assert_eq!(PixelFormat::R8.channels(), 1);
		assert_eq!(PixelFormat::Rgba8.channels(), 4);
	}
}
