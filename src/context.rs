use crate::error::{Error, Result};

use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContextSurfaceAccessor, PossiblyCurrentContext, Version};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Window, WindowBuilder};

use std::cell::Cell;
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::num::NonZeroU32;

pub use winit::event::VirtualKeyCode as Key;


#[derive(Debug, Clone)]
pub struct ContextDef {
	pub width: u32,
	pub height: u32,
	pub title: String,
	pub api_version: (u8, u8),
	pub core_profile: bool,
	pub depth_bits: u8,
	pub vsync: bool,
}

impl Default for ContextDef {
	fn default() -> ContextDef {
		ContextDef {
			width: 640,
			height: 480,
			title: String::from("Window!"),
			api_version: (4, 5),
			core_profile: true,
			depth_bits: 24,
			vsync: true,
		}
	}
}



/// What the render loop needs from a window: events, key state, presentation and a close flag.
pub trait Surface {
	fn should_close(&self) -> bool;
	fn poll_events(&mut self);
	fn swap_buffers(&mut self) -> Result<()>;
	fn is_key_pressed(&self, key: Key) -> bool;
	fn request_close(&mut self);
	fn size(&self) -> (u32, u32);
}



/// Remembers which object name is bound to a single binding point.
#[derive(Debug, Default)]
pub(crate) struct BindSlot(Cell<u32>);

impl BindSlot {
	/// Returns true if the caller needs to issue the native bind.
	pub fn bind(&self, name: u32) -> bool {
		if self.0.get() == name {
			return false
		}

		self.0.set(name);
		true
	}

	pub fn forget(&self, name: u32) {
		if self.0.get() == name {
			self.0.set(0);
		}
	}

	pub fn current(&self) -> u32 {
		self.0.get()
	}
}


const MAX_CACHED_TEXTURE_UNITS: usize = 32;

/// Proof that a GL context is current on this thread with its entry points loaded.
///
/// Owned by [`ContextHost`] and only lent out through [`ContextHost::split`]. Every GPU resource
/// borrows it, so resources can't outlive the host or be created before the context exists.
/// Not `Send`: the context is only current on the thread that created it.
#[derive(Debug)]
pub struct GlContext {
	program: BindSlot,
	vertex_array: BindSlot,
	texture_units: Vec<BindSlot>,
	max_texture_size: u32,

	_not_send: PhantomData<*const ()>,
}

impl GlContext {
	fn new() -> GlContext {
		let mut max_units = 0;
		let mut max_texture_size = 0;
		unsafe {
			gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut max_units);
			gl::GetIntegerv(gl::MAX_TEXTURE_SIZE, &mut max_texture_size);
		}

		let cached_units = (max_units.max(0) as usize).min(MAX_CACHED_TEXTURE_UNITS);

		GlContext {
			program: BindSlot::default(),
			vertex_array: BindSlot::default(),
			texture_units: (0..cached_units).map(|_| BindSlot::default()).collect(),
			max_texture_size: max_texture_size.max(0) as u32,
			_not_send: PhantomData,
		}
	}

	pub fn version_string(&self) -> String {
		gl_string(gl::VERSION)
	}

	pub fn renderer_string(&self) -> String {
		gl_string(gl::RENDERER)
	}

	/// Largest width or height a 2D texture may have.
	pub fn max_texture_size(&self) -> u32 {
		self.max_texture_size
	}

	pub fn set_viewport(&self, width: u32, height: u32) {
		unsafe {
			gl::Viewport(0, 0, width as i32, height as i32);
		}
	}

	pub fn set_depth_test(&self, enabled: bool) {
		unsafe {
			if enabled {
				gl::Enable(gl::DEPTH_TEST);
			} else {
				gl::Disable(gl::DEPTH_TEST);
			}
		}
	}

	pub fn clear(&self, color: [f32; 4], depth: bool) {
		let [r, g, b, a] = color;
		let mut mask = gl::COLOR_BUFFER_BIT;
		if depth {
			mask |= gl::DEPTH_BUFFER_BIT;
		}

		unsafe {
			gl::ClearColor(r, g, b, a);
			gl::Clear(mask);
		}
	}

	pub(crate) fn bind_program(&self, name: u32) {
		if self.program.bind(name) {
			unsafe { gl::UseProgram(name) }
		}
	}

	pub(crate) fn bind_vertex_array(&self, name: u32) {
		if self.vertex_array.bind(name) {
			unsafe { gl::BindVertexArray(name) }
		}
	}

	pub(crate) fn bind_texture_unit(&self, unit: u32, name: u32) {
		let needs_bind = match self.texture_units.get(unit as usize) {
			Some(slot) => slot.bind(name),
			None => true,
		};

		if needs_bind {
			unsafe { gl::BindTextureUnit(unit, name) }
		}
	}

	pub(crate) fn forget_program(&self, name: u32) {
		self.program.forget(name);
	}

	pub(crate) fn forget_vertex_array(&self, name: u32) {
		self.vertex_array.forget(name);
	}

	pub(crate) fn forget_texture(&self, name: u32) {
		for slot in self.texture_units.iter() {
			slot.forget(name);
		}
	}
}

fn gl_string(name: u32) -> String {
	unsafe {
		let ptr = gl::GetString(name);
		if ptr.is_null() {
			return String::new()
		}

		CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned()
	}
}



/// Owns the window, the event loop and the current GL context.
///
/// Resources are built against the [`GlContext`] borrowed from the host, so the host
/// can't be dropped while any of them are alive:
///
/// ```no_run
/// use gl_tutorials::*;
///
/// fn build() -> Result<()> {
/// 	let mut host = ContextHost::new(&ContextDef::default())?;
/// 	let (gl, window) = host.split();
///
/// 	let program = ShaderProgram::compile(gl, "", "")?;
/// 	let mesh = MeshBuffer::upload(gl, &[0.0f32; 3][..], VertexLayout::packed_floats(&[3]), BufferUsage::Static)?;
///
/// 	RenderLoop::new(window, DrawPass::new(gl, program, mesh), LoopDef::default()).run()?;
/// 	Ok(())
/// }
/// ```
///
/// ```compile_fail
/// use gl_tutorials::*;
///
/// fn build() -> Result<()> {
/// 	let mut host = ContextHost::new(&ContextDef::default())?;
/// 	let (gl, _window) = host.split();
///
/// 	drop(host);
/// 	let _program = ShaderProgram::compile(gl, "", "")?;
/// 	Ok(())
/// }
/// ```
pub struct ContextHost {
	window: HostWindow,
	gl: GlContext,
}

/// The window half of a [`ContextHost`]: events, key state and presentation.
pub struct HostWindow {
	// Declaration order is drop order: context, then surface, then window.
	gl_context: PossiblyCurrentContext,
	gl_surface: glutin::surface::Surface<WindowSurface>,
	window: Window,
	event_loop: EventLoop<()>,

	keys_down: HashSet<Key>,
	close_requested: bool,
	size: (u32, u32),
}

impl ContextHost {
	/// Opens a window, makes a GL context current on it and loads GL entry points.
	pub fn new(def: &ContextDef) -> Result<ContextHost> {
		let event_loop = EventLoop::new();

		let window_builder = WindowBuilder::new()
			.with_title(def.title.as_str())
			.with_inner_size(PhysicalSize::new(def.width, def.height));

		let template = ConfigTemplateBuilder::new()
			.with_depth_size(def.depth_bits);

		let (window, gl_config) = DisplayBuilder::new()
			.with_window_builder(Some(window_builder))
			.build(&event_loop, template, pick_config)
			.map_err(|err| Error::Init(err.to_string()))?;

		let window = window.ok_or_else(|| Error::WindowCreation("display created without a window".into()))?;
		let gl_display = gl_config.display();

		let (major, minor) = def.api_version;
		let profile = match def.core_profile {
			true => GlProfile::Core,
			false => GlProfile::Compatibility,
		};

		let context_attributes = ContextAttributesBuilder::new()
			.with_profile(profile)
			.with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
			.build(Some(window.raw_window_handle()));

		let not_current_context = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
			.map_err(|err| Error::WindowCreation(format!("GL {major}.{minor} context: {err}")))?;

		let surface_attributes = window.build_surface_attributes(Default::default());
		let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
			.map_err(|err| Error::WindowCreation(format!("window surface: {err}")))?;

		let gl_context = not_current_context.make_current(&gl_surface)
			.map_err(|err| Error::WindowCreation(format!("make current: {err}")))?;

		gl::load_with(|symbol| {
			let Ok(symbol) = CString::new(symbol) else {
				return std::ptr::null()
			};

			gl_display.get_proc_address(&symbol).cast()
		});

		check_loaded()?;

		if def.vsync {
			let interval = SwapInterval::Wait(NonZeroU32::MIN);
			if let Err(err) = gl_surface.set_swap_interval(&gl_context, interval) {
				log::warn!("Couldn't enable vsync: {err}");
			}
		}

		let gl = GlContext::new();

		let PhysicalSize { width, height } = window.inner_size();
		gl.set_viewport(width, height);

		log::info!("Created {width}x{height} window '{}'", def.title);
		log::info!("GL version: {}", gl.version_string());
		log::info!("GL renderer: {}", gl.renderer_string());

		let window = HostWindow {
			gl_context,
			gl_surface,
			window,
			event_loop,

			keys_down: HashSet::new(),
			close_requested: false,
			size: (width, height),
		};

		Ok(ContextHost { window, gl })
	}

	/// Borrows the token and the window at once, so resources built from the token can be
	/// drawn by a loop driving the window.
	pub fn split(&mut self) -> (&GlContext, &mut HostWindow) {
		(&self.gl, &mut self.window)
	}
}

impl HostWindow {
	fn resize(&mut self, width: u32, height: u32) {
		let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
			// Minimised
			return
		};

		self.gl_surface.resize(&self.gl_context, w, h);
		self.size = (width, height);

		unsafe {
			gl::Viewport(0, 0, width as i32, height as i32);
		}

		log::debug!("Resized to {width}x{height}");
	}
}

impl Surface for HostWindow {
	fn should_close(&self) -> bool {
		self.close_requested
	}

	fn poll_events(&mut self) {
		let mut resized = None;

		let HostWindow { event_loop, keys_down, close_requested, .. } = self;

		event_loop.run_return(|event, _, control_flow| {
			control_flow.set_poll();

			match event {
				Event::WindowEvent { event, .. } => match event {
					WindowEvent::CloseRequested => *close_requested = true,
					WindowEvent::Resized(size) => resized = Some(size),
					WindowEvent::Focused(false) => keys_down.clear(),

					WindowEvent::KeyboardInput { input: KeyboardInput { virtual_keycode: Some(key), state, .. }, .. } => {
						match state {
							ElementState::Pressed => keys_down.insert(key),
							ElementState::Released => keys_down.remove(&key),
						};
					}

					_ => {}
				}

				// Everything queued has been delivered
				Event::MainEventsCleared => control_flow.set_exit(),
				_ => {}
			}
		});

		if let Some(PhysicalSize { width, height }) = resized {
			self.resize(width, height);
		}
	}

	fn swap_buffers(&mut self) -> Result<()> {
		self.gl_surface.swap_buffers(&self.gl_context)?;
		Ok(())
	}

	fn is_key_pressed(&self, key: Key) -> bool {
		self.keys_down.contains(&key)
	}

	fn request_close(&mut self) {
		self.close_requested = true;
	}

	fn size(&self) -> (u32, u32) {
		self.size
	}
}

impl Drop for HostWindow {
	fn drop(&mut self) {
		log::debug!("Destroying GL context and window");
	}
}


/// Prefers the config with the most samples, as the glutin examples do.
///
/// glutin-winit 0.2 needs a config back from the picker, so a platform offering no config at all
/// panics here rather than failing with [`Error::Init`].
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
	most_samples(configs, |config| config.num_samples())
		.expect("glutin offered no GL configs")
}

fn most_samples<T>(candidates: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
	candidates.reduce(|best, candidate| if samples(&candidate) > samples(&best) { candidate } else { best })
}

fn check_loaded() -> Result<()> {
	let required = [
		("glClear", gl::Clear::is_loaded()),
		("glViewport", gl::Viewport::is_loaded()),
		("glCreateShader", gl::CreateShader::is_loaded()),
		("glCreateProgram", gl::CreateProgram::is_loaded()),
		("glCreateBuffers", gl::CreateBuffers::is_loaded()),
		("glCreateVertexArrays", gl::CreateVertexArrays::is_loaded()),
		("glCreateTextures", gl::CreateTextures::is_loaded()),
		("glBindTextureUnit", gl::BindTextureUnit::is_loaded()),
		("glDrawArrays", gl::DrawArrays::is_loaded()),
	];

	let missing: Vec<&str> = required.iter()
		.filter(|(_, loaded)| !loaded)
		.map(|(name, _)| *name)
		.collect();

	if !missing.is_empty() {
		return Err(Error::Loader(format!("missing {}", missing.join(", "))))
	}

	Ok(())
}
