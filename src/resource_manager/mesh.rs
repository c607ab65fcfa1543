use crate::context::GlContext;
use crate::error::{Error, Result};

// GL guarantees at least this many vertex attributes
const MAX_VERTEX_ATTRIBUTES: u32 = 16;


#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum ComponentType {
	Float = gl::FLOAT,
	Int = gl::INT,
	UnsignedInt = gl::UNSIGNED_INT,
}

impl ComponentType {
	pub fn size_bytes(self) -> u32 {
		match self {
			ComponentType::Float | ComponentType::Int | ComponentType::UnsignedInt => 4,
		}
	}

	fn is_integer(self) -> bool {
		!matches!(self, ComponentType::Float)
	}
}


#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
	pub index: u32,
	pub components: u32,
	pub component_type: ComponentType,
	/// Byte offset from the start of a vertex.
	pub offset: u32,
}

impl VertexAttribute {
	pub fn float(index: u32, components: u32, offset: u32) -> VertexAttribute {
		VertexAttribute {
			index,
			components,
			component_type: ComponentType::Float,
			offset,
		}
	}

	pub fn span_bytes(&self) -> u32 {
		self.components.saturating_mul(self.component_type.size_bytes())
	}
}


/// Interleaved attributes sharing one vertex buffer binding.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
	/// Bytes between consecutive vertices.
	pub stride: u32,
	pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
	pub fn new(stride: u32) -> VertexLayout {
		VertexLayout {
			stride,
			attributes: Vec::new(),
		}
	}

	pub fn with(mut self, attribute: VertexAttribute) -> VertexLayout {
		self.attributes.push(attribute);
		self
	}

	/// Tightly packed float attributes at consecutive indices, e.g. `&[3, 2]` for position + uv.
	pub fn packed_floats(component_counts: &[u32]) -> VertexLayout {
		let mut layout = VertexLayout::new(0);

		for (index, &components) in component_counts.iter().enumerate() {
			let attribute = VertexAttribute::float(index as u32, components, layout.stride);
			layout.stride = layout.stride.saturating_add(attribute.span_bytes());
			layout.attributes.push(attribute);
		}

		layout
	}

	pub fn validate(&self) -> Result<()> {
		if self.stride == 0 {
			return Err(Error::InvalidLayout(String::from("stride is zero")))
		}

		if self.attributes.is_empty() {
			return Err(Error::InvalidLayout(String::from("no attributes")))
		}

		for (position, attribute) in self.attributes.iter().enumerate() {
			let VertexAttribute { index, components, offset, .. } = *attribute;

			if !(1..=4).contains(&components) {
				return Err(Error::InvalidLayout(format!("attribute {index} has {components} components, expected 1-4")))
			}

			if index >= MAX_VERTEX_ATTRIBUTES {
				return Err(Error::InvalidLayout(format!("attribute index {index} out of range")))
			}

			let end = offset.saturating_add(attribute.span_bytes());
			if end > self.stride {
				return Err(Error::InvalidLayout(format!(
					"attribute {index} spans bytes {offset}..{end}, past the {} byte stride", self.stride)))
			}

			if self.attributes[..position].iter().any(|other| other.index == index) {
				return Err(Error::InvalidLayout(format!("attribute index {index} declared twice")))
			}
		}

		Ok(())
	}

	/// Number of whole vertices in `byte_len` bytes of vertex data.
	pub fn vertex_count(&self, byte_len: usize) -> Result<u32> {
		let stride = self.stride as usize;

		if byte_len == 0 {
			return Err(Error::InvalidLayout(String::from("no vertex data")))
		}

		if stride == 0 || byte_len % stride != 0 {
			return Err(Error::InvalidLayout(format!("{byte_len} bytes of vertex data isn't a multiple of the {stride} byte stride")))
		}

		u32::try_from(byte_len / stride)
			.map_err(|_| Error::InvalidLayout(String::from("too many vertices")))
	}
}


#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum BufferUsage {
	/// Contents never change after upload.
	#[default]
	Static,
	Dynamic,
}

impl BufferUsage {
	fn storage_flags(self) -> u32 {
		match self {
			BufferUsage::Static => 0,
			BufferUsage::Dynamic => gl::DYNAMIC_STORAGE_BIT,
		}
	}
}



/// An immutable vertex buffer plus the vertex array describing it.
#[derive(Debug)]
pub struct MeshBuffer<'gl> {
	gl: &'gl GlContext,
	vao_name: u32,
	buffer_name: u32,
	layout: VertexLayout,
	vertex_count: u32,
}

impl<'gl> MeshBuffer<'gl> {
	/// Nothing touches the GPU unless `layout` is valid and `data` holds a whole number of vertices.
	pub fn upload<T>(gl: &'gl GlContext, data: &[T], layout: VertexLayout, usage: BufferUsage) -> Result<Self>
		where T: Copy
	{
		layout.validate()?;

		let byte_len = std::mem::size_of_val(data);
		let vertex_count = layout.vertex_count(byte_len)?;

		let mut buffer_name = 0;
		let mut vao_name = 0;

		unsafe {
			gl::CreateBuffers(1, &mut buffer_name);
			gl::NamedBufferStorage(buffer_name, byte_len as isize, data.as_ptr() as *const _, usage.storage_flags());

			gl::CreateVertexArrays(1, &mut vao_name);
			gl::VertexArrayVertexBuffer(vao_name, 0, buffer_name, 0, layout.stride as i32);

			for attribute in layout.attributes.iter() {
				let VertexAttribute { index, components, component_type, offset } = *attribute;

				gl::EnableVertexArrayAttrib(vao_name, index);

				if component_type.is_integer() {
					gl::VertexArrayAttribIFormat(vao_name, index, components as i32, component_type as u32, offset);
				} else {
					gl::VertexArrayAttribFormat(vao_name, index, components as i32, component_type as u32, gl::FALSE, offset);
				}

				gl::VertexArrayAttribBinding(vao_name, index, 0);
			}
		}

		log::debug!("Uploaded mesh: {vertex_count} vertices, {byte_len} bytes, stride {}", layout.stride);

		Ok(MeshBuffer {
			gl,
			vao_name,
			buffer_name,
			layout,
			vertex_count,
		})
	}

	pub fn with_label(self, label: &str) -> Self {
		super::label_object(gl::VERTEX_ARRAY, self.vao_name, label);
		super::label_object(gl::BUFFER, self.buffer_name, label);
		self
	}

	pub fn bind(&self) {
		self.gl.bind_vertex_array(self.vao_name);
	}

	pub fn draw_count(&self) -> u32 {
		self.vertex_count
	}

	pub fn layout(&self) -> &VertexLayout {
		&self.layout
	}
}

impl Drop for MeshBuffer<'_> {
	fn drop(&mut self) {
		log::trace!("Deleting mesh vao {} buffer {}", self.vao_name, self.buffer_name);

		self.gl.forget_vertex_array(self.vao_name);
		unsafe {
			gl::DeleteVertexArrays(1, &self.vao_name);
			gl::DeleteBuffers(1, &self.buffer_name);
		}
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	fn position_colour() -> VertexLayout {
		VertexLayout::new(24)
			.with(VertexAttribute::float(0, 3, 0))
			.with(VertexAttribute::float(1, 3, 12))
	}

	#[test]
	fn position_colour_layout_is_valid() {
		let layout = position_colour();
		assert!(layout.validate().is_ok());

		// Three vertices of six floats
		let data = [0.0f32; 18];
		assert_eq!(layout.vertex_count(std::mem::size_of_val(&data)).unwrap(), 3);
	}

	#[test]
	fn attribute_past_stride_is_rejected() {
		let layout = VertexLayout::new(20)
			.with(VertexAttribute::float(0, 3, 0))
			.with(VertexAttribute::float(1, 3, 12));

		assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));

		let layout = VertexLayout::new(12)
			.with(VertexAttribute::float(0, 3, 4));

		assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));
	}

	#[test]
	fn attribute_ending_exactly_at_stride_is_fine() {
		let layout = VertexLayout::new(20)
			.with(VertexAttribute::float(0, 3, 0))
			.with(VertexAttribute::float(1, 2, 12));

		assert!(layout.validate().is_ok());
	}

	#[test]
	fn bad_component_counts_are_rejected() {
		for components in [0, 5] {
			let layout = VertexLayout::new(64).with(VertexAttribute::float(0, components, 0));
			assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))), "{components} components");
		}
	}

	#[test]
	fn degenerate_layouts_are_rejected() {
		assert!(VertexLayout::new(0).with(VertexAttribute::float(0, 1, 0)).validate().is_err());
		assert!(VertexLayout::new(16).validate().is_err());
		assert!(VertexLayout::new(16).with(VertexAttribute::float(16, 1, 0)).validate().is_err());

		let duplicated = VertexLayout::new(16)
			.with(VertexAttribute::float(0, 2, 0))
			.with(VertexAttribute::float(0, 2, 8));
		assert!(duplicated.validate().is_err());
	}

	#[test]
	fn partial_vertices_are_rejected() {
		let layout = position_colour();

		assert!(layout.vertex_count(0).is_err());
		assert!(layout.vertex_count(25).is_err());
		assert_eq!(layout.vertex_count(48).unwrap(), 2);
	}

	#[test]
	fn packed_floats_matches_hand_written_layout() {
		assert_eq!(VertexLayout::packed_floats(&[3, 3]), position_colour());

		let cube = VertexLayout::packed_floats(&[3, 2]);
		assert_eq!(cube.stride, 20);
		assert_eq!(cube.attributes[1], VertexAttribute::float(1, 2, 12));
		assert_eq!(cube.vertex_count(36 * 20).unwrap(), 36);
	}

	#[test]
	fn huge_component_counts_fail_validation() {
		let layout = VertexLayout::packed_floats(&[u32::MAX]);
		assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));

		let layout = VertexLayout::packed_floats(&[3, u32::MAX, 2]);
		assert_eq!(layout.stride, u32::MAX);
		assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));

		let attribute = VertexAttribute::float(0, u32::MAX, u32::MAX);
		assert_eq!(attribute.span_bytes(), u32::MAX);
		assert!(matches!(VertexLayout::new(16).with(attribute).validate(), Err(Error::InvalidLayout(_))));
	}

	#[test]
	fn integer_attributes_use_integer_path() {
		assert!(ComponentType::Int.is_integer());
		assert!(ComponentType::UnsignedInt.is_integer());
		assert!(!ComponentType::Float.is_integer());
		assert_eq!(ComponentType::Float.size_bytes(), 4);
	}
}
