use crate::context::GlContext;
use crate::error::{Error, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;
use std::ffi::CString;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum ShaderStage {
	Vertex = gl::VERTEX_SHADER,
	Fragment = gl::FRAGMENT_SHADER,
}

impl std::fmt::Display for ShaderStage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ShaderStage::Vertex => f.write_str("vertex"),
			ShaderStage::Fragment => f.write_str("fragment"),
		}
	}
}



/// A linked vertex + fragment program. Stage objects are released as soon as linking finishes.
#[derive(Debug)]
pub struct ShaderProgram<'gl> {
	gl: &'gl GlContext,
	name: u32,
	uniforms: UniformCache,
}

impl<'gl> ShaderProgram<'gl> {
	/// Compiles both stages before judging the result, so a broken vertex stage doesn't hide
	/// fragment diagnostics. Every stage failure is logged; the first one is returned.
	pub fn compile(gl: &'gl GlContext, vertex_source: &str, fragment_source: &str) -> Result<Self> {
		let results = vec![
			(ShaderStage::Vertex, compile_stage(ShaderStage::Vertex, vertex_source)),
			(ShaderStage::Fragment, compile_stage(ShaderStage::Fragment, fragment_source)),
		];

		let units = judge_stages(results, |unit| unsafe { gl::DeleteShader(unit) })?;
		let name = link_program(&units)?;

		log::debug!("Linked shader program {name}");

		Ok(ShaderProgram {
			gl,
			name,
			uniforms: UniformCache::default(),
		})
	}

	pub fn with_label(self, label: &str) -> Self {
		super::label_object(gl::PROGRAM, self.name, label);
		self
	}

	pub fn name(&self) -> u32 {
		self.name
	}

	pub fn bind(&self) {
		self.gl.bind_program(self.name);
	}

	/// Sets a uniform by name. Names the program doesn't have are ignored.
	pub fn set_uniform(&mut self, name: &str, value: impl UniformValue) {
		if let Some(location) = self.uniform_location(name) {
			value.upload(self.name, location);
		}
	}

	pub fn uniform_location(&mut self, name: &str) -> Option<i32> {
		let program = self.name;

		self.uniforms.resolve(name, |name| {
			let name = CString::new(name).ok()?;
			let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
			(location >= 0).then_some(location)
		})
	}
}

impl Drop for ShaderProgram<'_> {
	fn drop(&mut self) {
		log::trace!("Deleting shader program {}", self.name);

		self.gl.forget_program(self.name);
		unsafe {
			gl::DeleteProgram(self.name);
		}
	}
}



pub trait UniformValue {
	fn upload(&self, program: u32, location: i32);
}

impl UniformValue for f32 {
	fn upload(&self, program: u32, location: i32) {
		unsafe { gl::ProgramUniform1f(program, location, *self) }
	}
}

impl UniformValue for i32 {
	fn upload(&self, program: u32, location: i32) {
		unsafe { gl::ProgramUniform1i(program, location, *self) }
	}
}

impl UniformValue for Vec2 {
	fn upload(&self, program: u32, location: i32) {
		unsafe { gl::ProgramUniform2fv(program, location, 1, self.to_array().as_ptr()) }
	}
}

impl UniformValue for Vec3 {
	fn upload(&self, program: u32, location: i32) {
		unsafe { gl::ProgramUniform3fv(program, location, 1, self.to_array().as_ptr()) }
	}
}

impl UniformValue for Vec4 {
	fn upload(&self, program: u32, location: i32) {
		unsafe { gl::ProgramUniform4fv(program, location, 1, self.to_array().as_ptr()) }
	}
}

impl UniformValue for Mat4 {
	fn upload(&self, program: u32, location: i32) {
		unsafe { gl::ProgramUniformMatrix4fv(program, location, 1, gl::FALSE, self.to_cols_array().as_ptr()) }
	}
}



/// Uniform name -> location, including names the program turned out not to have.
#[derive(Debug, Default)]
pub(crate) struct UniformCache {
	locations: HashMap<String, Option<i32>>,
}

impl UniformCache {
	pub fn resolve(&mut self, name: &str, lookup: impl FnOnce(&str) -> Option<i32>) -> Option<i32> {
		if let Some(location) = self.locations.get(name) {
			return *location
		}

		let location = lookup(name);
		if location.is_none() {
			log::debug!("Uniform '{name}' not found in program, sets will be ignored");
		}

		self.locations.insert(name.to_owned(), location);
		location
	}
}



type StageResult<U> = std::result::Result<U, String>;

/// Turns per-stage compile results into either every compiled unit or the first failure.
/// On failure the units that did compile are handed to `release`.
pub(crate) fn judge_stages<U>(results: Vec<(ShaderStage, StageResult<U>)>, release: impl FnMut(U)) -> Result<Vec<U>> {
	let mut compiled = Vec::with_capacity(results.len());
	let mut first_failure = None;

	for (stage, result) in results {
		match result {
			Ok(unit) => compiled.push(unit),
			Err(log) => {
				log::error!("{stage} shader compilation error:\n{log}");
				first_failure.get_or_insert(Error::ShaderCompile { stage, log });
			}
		}
	}

	if let Some(error) = first_failure {
		compiled.into_iter().for_each(release);
		return Err(error)
	}

	Ok(compiled)
}


fn compile_stage(stage: ShaderStage, source: &str) -> StageResult<u32> {
	let source = CString::new(source)
		.map_err(|_| String::from("shader source contains an interior nul byte"))?;

	unsafe {
		let unit = gl::CreateShader(stage as u32);
		if unit == 0 {
			return Err(String::from("glCreateShader failed"))
		}

		gl::ShaderSource(unit, 1, &source.as_ptr(), std::ptr::null());
		gl::CompileShader(unit);

		let mut status = 0;
		gl::GetShaderiv(unit, gl::COMPILE_STATUS, &mut status);

		if status == 0 {
			let log = read_info_log(unit, gl::GetShaderiv, gl::GetShaderInfoLog);
			gl::DeleteShader(unit);
			return Err(log)
		}

		Ok(unit)
	}
}


fn link_program(units: &[u32]) -> Result<u32> {
	unsafe {
		let program = gl::CreateProgram();
		if program == 0 {
			for &unit in units {
				gl::DeleteShader(unit);
			}

			return Err(Error::ProgramLink { log: String::from("glCreateProgram failed") })
		}

		for &unit in units {
			gl::AttachShader(program, unit);
		}

		gl::LinkProgram(program);

		// Stage objects aren't needed once the program is linked, whatever the outcome
		for &unit in units {
			gl::DetachShader(program, unit);
			gl::DeleteShader(unit);
		}

		let mut status = 0;
		gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

		if status == 0 {
			let log = read_info_log(program, gl::GetProgramiv, gl::GetProgramInfoLog);
			gl::DeleteProgram(program);

			log::error!("Program linking error:\n{log}");
			return Err(Error::ProgramLink { log })
		}

		Ok(program)
	}
}


type GetParamFn = unsafe fn(u32, u32, *mut i32);
type GetInfoLogFn = unsafe fn(u32, i32, *mut i32, *mut gl::types::GLchar);

unsafe fn read_info_log(object: u32, get_param: GetParamFn, get_info_log: GetInfoLogFn) -> String {
	let mut length = 0;
	get_param(object, gl::INFO_LOG_LENGTH, &mut length);

	let mut buf = vec![0u8; length.max(1) as usize];
	let mut written = 0;
	get_info_log(object, buf.len() as i32, &mut written, buf.as_mut_ptr() as *mut _);

	buf.truncate(written.max(0) as usize);

	let log = String::from_utf8_lossy(&buf).trim_end().to_owned();
	if log.is_empty() {
		String::from("(driver gave no diagnostic output)")
	} else {
		log
	}
}
