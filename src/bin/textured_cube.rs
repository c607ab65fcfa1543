use gl_tutorials::*;
use glam::{Mat4, Vec3};
use std::f32::consts::PI;


const VERTEX_SOURCE: &str = r#"#version 450 core
layout (location = 0) in vec3 vertex;
layout (location = 1) in vec2 texCoords;
layout (location = 0) out vec2 fTexCoords;

uniform mat4 model;
uniform mat4 projection;

void main() {
	gl_Position = projection * model * vec4(vertex, 1.0);
	fTexCoords = texCoords;
}
"#;

const FRAGMENT_SOURCE: &str = r#"#version 450 core
layout (location = 0) in vec2 fTexCoords;
out vec4 fragColor;

uniform sampler2D basicTexture;

void main() {
	fragColor = texture(basicTexture, fTexCoords);
}
"#;

const TEXTURE_PATH: &str = "textures/crate.png";


struct SpinningCube<'gl> {
	pass: DrawPass<'gl>,
}

impl MainLoop for SpinningCube<'_> {
	fn present(&mut self, frame: &FrameInfo) {
		let projection = Mat4::perspective_rh_gl(PI / 3.0, frame.aspect_ratio(), 0.01, 100.0);
		let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0))
			* Mat4::from_rotation_x(frame.elapsed * 0.5)
			* Mat4::from_rotation_y(frame.elapsed);

		let program = self.pass.program_mut();
		program.set_uniform("projection", projection);
		program.set_uniform("model", model);

		self.pass.present(frame);
	}
}


fn main() -> anyhow::Result<()> {
	logging::init_logging(logging::LoggingConfig::default());

	let resources = ResourceManager::new()?;
	let mut host = ContextHost::new(&ContextDef::default())?;
	let (gl, window) = host.split();

	let mut program = ShaderProgram::compile(gl, VERTEX_SOURCE, FRAGMENT_SOURCE)?
		.with_label("textured cube");
	program.set_uniform("basicTexture", 0i32);

	let vertices = cube_vertices();
	let mesh = MeshBuffer::upload(gl, vertices.as_slice(), VertexLayout::packed_floats(&[3, 2]), BufferUsage::Static)?
		.with_label("cube");

	// Decoded pixels are freed as soon as they're on the GPU
	let texture = {
		let image = resources.load_image(TEXTURE_PATH.as_ref())?;
		Texture2D::from_image(gl, &image, TextureParams::default())?
			.with_label(TEXTURE_PATH)
	};

	let pass = DrawPass::new(gl, program, mesh)
		.texture(0, texture)
		.depth_test(true);

	let report = RenderLoop::new(window, SpinningCube { pass }, LoopDef::default()).run()?;
	log::info!("Presented {} frames", report.frames);

	Ok(())
}


// x, y, z, s, t
fn cube_vertices() -> Vec<[f32; 5]> {
	const FACES: [[[f32; 5]; 4]; 6] = [
		// back
		[[-0.5, -0.5, -0.5, 0.0, 0.0], [ 0.5, -0.5, -0.5, 1.0, 0.0], [ 0.5,  0.5, -0.5, 1.0, 1.0], [-0.5,  0.5, -0.5, 0.0, 1.0]],
		// front
		[[-0.5, -0.5,  0.5, 0.0, 0.0], [ 0.5, -0.5,  0.5, 1.0, 0.0], [ 0.5,  0.5,  0.5, 1.0, 1.0], [-0.5,  0.5,  0.5, 0.0, 1.0]],
		// left
		[[-0.5, -0.5, -0.5, 0.0, 0.0], [-0.5, -0.5,  0.5, 1.0, 0.0], [-0.5,  0.5,  0.5, 1.0, 1.0], [-0.5,  0.5, -0.5, 0.0, 1.0]],
		// right
		[[ 0.5, -0.5,  0.5, 0.0, 0.0], [ 0.5, -0.5, -0.5, 1.0, 0.0], [ 0.5,  0.5, -0.5, 1.0, 1.0], [ 0.5,  0.5,  0.5, 0.0, 1.0]],
		// bottom
		[[-0.5, -0.5, -0.5, 0.0, 0.0], [ 0.5, -0.5, -0.5, 1.0, 0.0], [ 0.5, -0.5,  0.5, 1.0, 1.0], [-0.5, -0.5,  0.5, 0.0, 1.0]],
		// top
		[[-0.5,  0.5,  0.5, 0.0, 0.0], [ 0.5,  0.5,  0.5, 1.0, 0.0], [ 0.5,  0.5, -0.5, 1.0, 1.0], [-0.5,  0.5, -0.5, 0.0, 1.0]],
	];

	FACES.iter()
		.flat_map(|[a, b, c, d]| [*a, *b, *c, *c, *d, *a])
		.collect()
}
