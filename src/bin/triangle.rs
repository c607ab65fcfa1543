use gl_tutorials::*;


const VERTEX_SOURCE: &str = r#"#version 450 core
layout (location = 0) in vec3 vertexPosition;
layout (location = 1) in vec3 vertexColor;
layout (location = 0) out vec3 fragmentColor;

void main() {
	gl_Position = vec4(vertexPosition, 1.0);
	fragmentColor = vertexColor;
}
"#;

const FRAGMENT_SOURCE: &str = r#"#version 450 core
layout (location = 0) in vec3 fragmentColor;
out vec4 finalColor;

void main() {
	finalColor = vec4(fragmentColor, 1.0);
}
"#;

// x, y, z, r, g, b
const VERTICES: [[f32; 6]; 3] = [
	[-0.25, -0.25, 0.0, 1.0, 0.0, 0.0],
	[ 0.0,   0.25, 0.0, 0.0, 1.0, 0.0],
	[ 0.25, -0.25, 0.0, 0.0, 0.0, 1.0],
];


fn main() -> anyhow::Result<()> {
	logging::init_logging(logging::LoggingConfig::default());

	let mut host = ContextHost::new(&ContextDef::default())?;
	let (gl, window) = host.split();

	let program = ShaderProgram::compile(gl, VERTEX_SOURCE, FRAGMENT_SOURCE)?
		.with_label("triangle");

	let layout = VertexLayout::new(6 * 4)
		.with(VertexAttribute::float(0, 3, 0))
		.with(VertexAttribute::float(1, 3, 3 * 4));

	let mesh = MeshBuffer::upload(gl, &VERTICES[..], layout, BufferUsage::Static)?
		.with_label("triangle");

	let pass = DrawPass::new(gl, program, mesh);

	let report = RenderLoop::new(window, pass, LoopDef::default()).run()?;
	log::info!("Presented {} frames", report.frames);

	Ok(())
}
