use crate::resource_manager::shader::ShaderStage;
use thiserror::Error;


pub type Result<T> = std::result::Result<T, Error>;


#[derive(Error, Debug)]
pub enum Error {
	/// The windowing layer could not create a display connection.
	#[error("Failed to initialise windowing system: {0}")]
	Init(String),

	#[error("Failed to create window or GL context: {0}")]
	WindowCreation(String),

	/// GL entry points could not be resolved after the context was made current.
	#[error("Failed to load GL function pointers: {0}")]
	Loader(String),

	#[error("Failed to compile {stage} shader:\n{log}")]
	ShaderCompile {
		stage: ShaderStage,
		log: String,
	},

	#[error("Failed to link shader program:\n{log}")]
	ProgramLink {
		log: String,
	},

	#[error("Invalid vertex layout: {0}")]
	InvalidLayout(String),

	#[error("Failed to decode image: {0}")]
	Decode(String),

	#[error("Failed to present frame: {0}")]
	Swap(#[from] glutin::error::Error),

	#[error("Resource error: {0}")]
	Resource(String),
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shader_compile_message_names_stage() {
		let error = Error::ShaderCompile {
			stage: ShaderStage::Fragment,
			log: "0:3(1): error: syntax error".into(),
		};

		let message = error.to_string();
		assert!(message.starts_with("Failed to compile fragment shader"));
		assert!(message.contains("syntax error"));
	}
}
