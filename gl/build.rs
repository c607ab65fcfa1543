use gl_generator::{Registry, Api, Profile, Fallbacks, GlobalGenerator};
use std::env;
use std::fs::File;
use std::path::Path;

fn main() {
	let dest = env::var("OUT_DIR").unwrap();
	let mut file = File::create(Path::new(&dest).join("gl_bindings.rs")).unwrap();

	// Direct state access is core from 4.5 onwards
	let extensions: [&str; 0] = [];

	Registry::new(Api::Gl, (4, 5), Profile::Core, Fallbacks::All, extensions)
		.write_bindings(GlobalGenerator, &mut file)
		.unwrap();
}
