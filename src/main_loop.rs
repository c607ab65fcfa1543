use crate::context::{GlContext, Key, Surface};
use crate::error::Result;
use crate::resource_manager::{MeshBuffer, ShaderProgram, Texture2D};

use std::time::Instant;


#[derive(Debug, Clone)]
pub struct LoopDef {
	pub clear_color: [f32; 4],
	pub exit_key: Key,
}

impl Default for LoopDef {
	fn default() -> LoopDef {
		LoopDef {
			clear_color: [0.25, 0.5, 0.75, 1.0],
			exit_key: Key::Escape,
		}
	}
}


#[derive(Debug, Clone)]
pub struct FrameInfo {
	pub index: u64,
	/// Seconds since the loop started.
	pub elapsed: f32,
	pub surface_size: (u32, u32),
	pub clear_color: [f32; 4],
}

impl FrameInfo {
	pub fn aspect_ratio(&self) -> f32 {
		let (width, height) = self.surface_size;
		width as f32 / height.max(1) as f32
	}
}


/// Per-frame drawing. Implementors own the GPU resources they draw with; they're
/// dropped when the loop finishes.
pub trait MainLoop {
	fn present(&mut self, frame: &FrameInfo);
}


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
	Running,
	Stopped,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoopReport {
	pub frames: u64,
}


pub struct RenderLoop<'s, S: Surface, M: MainLoop> {
	surface: &'s mut S,
	main: M,
	def: LoopDef,
	state: LoopState,
	frames: u64,
	start: Instant,
}

impl<'s, S: Surface, M: MainLoop> RenderLoop<'s, S, M> {
	pub fn new(surface: &'s mut S, main: M, def: LoopDef) -> Self {
		RenderLoop {
			surface,
			main,
			def,
			state: LoopState::Running,
			frames: 0,
			start: Instant::now(),
		}
	}

	pub fn state(&self) -> LoopState {
		self.state
	}

	/// One iteration: poll, check for exit, draw, present.
	/// Once stopped this does nothing.
	pub fn step(&mut self) -> Result<LoopState> {
		if self.state == LoopState::Stopped {
			return Ok(LoopState::Stopped)
		}

		if self.surface.should_close() {
			self.state = LoopState::Stopped;
			return Ok(self.state)
		}

		self.surface.poll_events();

		if self.surface.is_key_pressed(self.def.exit_key) {
			log::debug!("Exit key {:?} pressed", self.def.exit_key);
			self.surface.request_close();
			self.state = LoopState::Stopped;
			return Ok(self.state)
		}

		// Window manager close arrived during the poll
		if self.surface.should_close() {
			self.state = LoopState::Stopped;
			return Ok(self.state)
		}

		let frame = FrameInfo {
			index: self.frames,
			elapsed: self.start.elapsed().as_secs_f32(),
			surface_size: self.surface.size(),
			clear_color: self.def.clear_color,
		};

		self.main.present(&frame);
		self.surface.swap_buffers()?;
		self.frames += 1;

		Ok(self.state)
	}

	/// Runs until the surface asks to close, then drops everything `main` owns.
	pub fn run(mut self) -> Result<LoopReport> {
		log::info!("Entering render loop");
		self.start = Instant::now();

		while self.step()? == LoopState::Running {}

		let RenderLoop { main, frames, .. } = self;

		log::info!("Render loop stopped after {frames} frames, tearing down");
		drop(main);

		Ok(LoopReport { frames })
	}
}



#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum PrimitiveType {
	Points = gl::POINTS,
	Lines = gl::LINES,
	Triangles = gl::TRIANGLES,
}


/// Clears and nothing else.
#[derive(Debug)]
pub struct ClearPass<'gl> {
	gl: &'gl GlContext,
}

impl<'gl> ClearPass<'gl> {
	pub fn new(gl: &'gl GlContext) -> Self {
		ClearPass { gl }
	}
}

impl MainLoop for ClearPass<'_> {
	fn present(&mut self, frame: &FrameInfo) {
		self.gl.clear(frame.clear_color, false);
	}
}


/// One program drawing the whole of one mesh, with optional textures.
#[derive(Debug)]
pub struct DrawPass<'gl> {
	gl: &'gl GlContext,

	// Dropped in declaration order: textures and mesh before the program
	textures: Vec<(u32, Texture2D<'gl>)>,
	mesh: MeshBuffer<'gl>,
	program: ShaderProgram<'gl>,

	primitive_type: PrimitiveType,
	depth_test: bool,
}

impl<'gl> DrawPass<'gl> {
	pub fn new(gl: &'gl GlContext, program: ShaderProgram<'gl>, mesh: MeshBuffer<'gl>) -> Self {
		DrawPass {
			gl,
			textures: Vec::new(),
			mesh,
			program,
			primitive_type: PrimitiveType::Triangles,
			depth_test: false,
		}
	}

	pub fn texture(mut self, unit: u32, texture: Texture2D<'gl>) -> Self {
		self.textures.retain(|(bound_unit, _)| *bound_unit != unit);
		self.textures.push((unit, texture));
		self
	}

	pub fn primitive(mut self, primitive_type: PrimitiveType) -> Self {
		self.primitive_type = primitive_type;
		self
	}

	pub fn depth_test(mut self, enabled: bool) -> Self {
		self.depth_test = enabled;
		self.gl.set_depth_test(enabled);
		self
	}

	pub fn program_mut(&mut self) -> &mut ShaderProgram<'gl> {
		&mut self.program
	}

	pub fn mesh(&self) -> &MeshBuffer<'gl> {
		&self.mesh
	}
}

impl MainLoop for DrawPass<'_> {
	fn present(&mut self, frame: &FrameInfo) {
		self.gl.clear(frame.clear_color, self.depth_test);

		self.program.bind();
		self.mesh.bind();

		for (unit, texture) in self.textures.iter() {
			texture.bind_to_unit(*unit);
		}

		unsafe {
			gl::DrawArrays(self.primitive_type as u32, 0, self.mesh.draw_count() as i32);
		}
	}
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource_manager::{VertexAttribute, VertexLayout};
	use std::cell::{Cell, RefCell};
	use std::rc::Rc;

	#[derive(Default)]
	struct FakeSurface {
		close: bool,
		pressed: Vec<Key>,
		// Keys that go down during the nth poll
		press_on_poll: Option<(u32, Key)>,
		close_on_poll: Option<u32>,
		polls: u32,
		swaps: u32,
		log: Rc<RefCell<Vec<&'static str>>>,
	}

	impl Surface for FakeSurface {
		fn should_close(&self) -> bool {
			self.close
		}

		fn poll_events(&mut self) {
			self.polls += 1;
			match self.press_on_poll {
				Some((poll, key)) if poll == self.polls => self.pressed.push(key),
				_ => {}
			}
			if self.close_on_poll == Some(self.polls) {
				self.close = true;
			}
		}

		fn swap_buffers(&mut self) -> Result<()> {
			self.swaps += 1;
			self.log.borrow_mut().push("swap");
			Ok(())
		}

		fn is_key_pressed(&self, key: Key) -> bool {
			self.pressed.contains(&key)
		}

		fn request_close(&mut self) {
			self.close = true;
		}

		fn size(&self) -> (u32, u32) {
			(640, 480)
		}
	}

	struct FakeScene {
		vertex_count: u32,
		draws: Rc<Cell<u32>>,
		teardowns: Rc<Cell<u32>>,
		log: Rc<RefCell<Vec<&'static str>>>,
		last_frame: Rc<RefCell<Option<FrameInfo>>>,
	}

	impl MainLoop for FakeScene {
		fn present(&mut self, frame: &FrameInfo) {
			assert_eq!(self.vertex_count, 3);
			self.draws.set(self.draws.get() + 1);
			self.log.borrow_mut().push("draw");
			*self.last_frame.borrow_mut() = Some(frame.clone());
		}
	}

	impl Drop for FakeScene {
		fn drop(&mut self) {
			self.teardowns.set(self.teardowns.get() + 1);
			self.log.borrow_mut().push("teardown");
		}
	}

	struct Counters {
		draws: Rc<Cell<u32>>,
		teardowns: Rc<Cell<u32>>,
		log: Rc<RefCell<Vec<&'static str>>>,
		last_frame: Rc<RefCell<Option<FrameInfo>>>,
	}

	fn scene(surface: &FakeSurface) -> (FakeScene, Counters) {
		let counters = Counters {
			draws: Rc::default(),
			teardowns: Rc::default(),
			log: surface.log.clone(),
			last_frame: Rc::default(),
		};

		// Same shape as the triangle demo: position + colour, three vertices
		let layout = VertexLayout::new(24)
			.with(VertexAttribute::float(0, 3, 0))
			.with(VertexAttribute::float(1, 3, 12));
		let vertices = [0.0f32; 18];

		let scene = FakeScene {
			vertex_count: layout.vertex_count(std::mem::size_of_val(&vertices)).unwrap(),
			draws: counters.draws.clone(),
			teardowns: counters.teardowns.clone(),
			log: counters.log.clone(),
			last_frame: counters.last_frame.clone(),
		};

		(scene, counters)
	}

	#[test]
	fn exit_key_on_first_frame_draws_nothing() {
		let mut surface = FakeSurface {
			press_on_poll: Some((1, Key::Escape)),
			.. FakeSurface::default()
		};

		let (scene, counters) = scene(&surface);
		let report = RenderLoop::new(&mut surface, scene, LoopDef::default()).run().unwrap();

		assert_eq!(report.frames, 0);
		assert_eq!(counters.draws.get(), 0);
		assert_eq!(surface.swaps, 0);
		assert!(surface.should_close());
		assert_eq!(counters.teardowns.get(), 1);
	}

	#[test]
	fn one_frame_then_exit() {
		let mut surface = FakeSurface {
			press_on_poll: Some((2, Key::Escape)),
			.. FakeSurface::default()
		};

		let (scene, counters) = scene(&surface);
		let report = RenderLoop::new(&mut surface, scene, LoopDef::default()).run().unwrap();

		assert_eq!(report.frames, 1);
		assert_eq!(counters.draws.get(), 1);
		assert_eq!(*counters.log.borrow(), vec!["draw", "swap", "teardown"]);

		let frame = counters.last_frame.borrow().clone().unwrap();
		assert_eq!(frame.index, 0);
		assert_eq!(frame.surface_size, (640, 480));
		assert_eq!(frame.clear_color, LoopDef::default().clear_color);
	}

	#[test]
	fn window_close_stops_without_drawing_that_frame() {
		let mut surface = FakeSurface {
			close_on_poll: Some(3),
			.. FakeSurface::default()
		};

		let (scene, counters) = scene(&surface);
		let report = RenderLoop::new(&mut surface, scene, LoopDef::default()).run().unwrap();

		assert_eq!(report.frames, 2);
		assert_eq!(counters.draws.get(), 2);
		assert_eq!(surface.swaps, 2);
		assert_eq!(counters.teardowns.get(), 1);
	}

	#[test]
	fn already_closed_surface_never_polls() {
		let mut surface = FakeSurface {
			close: true,
			.. FakeSurface::default()
		};

		let (scene, counters) = scene(&surface);
		RenderLoop::new(&mut surface, scene, LoopDef::default()).run().unwrap();

		assert_eq!(surface.polls, 0);
		assert_eq!(counters.draws.get(), 0);
		assert_eq!(counters.teardowns.get(), 1);
	}

	#[test]
	fn stopped_loop_stays_stopped() {
		let mut surface = FakeSurface {
			press_on_poll: Some((1, Key::Escape)),
			.. FakeSurface::default()
		};

		let (scene, counters) = scene(&surface);

		{
			let mut render_loop = RenderLoop::new(&mut surface, scene, LoopDef::default());
			assert_eq!(render_loop.state(), LoopState::Running);
			assert_eq!(render_loop.step().unwrap(), LoopState::Stopped);

			for _ in 0..3 {
				assert_eq!(render_loop.step().unwrap(), LoopState::Stopped);
			}
		}

		assert_eq!(surface.polls, 1);
		assert_eq!(surface.swaps, 0);
		assert_eq!(counters.draws.get(), 0);
		assert_eq!(counters.teardowns.get(), 1);
	}

	#[test]
	fn custom_exit_key() {
		let mut surface = FakeSurface {
			press_on_poll: Some((1, Key::Escape)),
			close_on_poll: Some(2),
			.. FakeSurface::default()
		};

		let def = LoopDef { exit_key: Key::Q, .. LoopDef::default() };
		let (scene, counters) = scene(&surface);
		let report = RenderLoop::new(&mut surface, scene, def).run().unwrap();

		// Escape is ignored, the window close ends it
		assert_eq!(report.frames, 1);
		assert_eq!(counters.draws.get(), 1);
	}

	#[test]
	fn aspect_ratio_guards_zero_height() {
		let frame = FrameInfo {
			index: 0,
			elapsed: 0.0,
			surface_size: (640, 0),
			clear_color: [0.0; 4],
		};

		assert_eq!(frame.aspect_ratio(), 640.0);
	}
}
