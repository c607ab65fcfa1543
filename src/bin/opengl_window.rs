use gl_tutorials::*;


fn main() -> anyhow::Result<()> {
	logging::init_logging(logging::LoggingConfig::default());

	let mut host = ContextHost::new(&ContextDef::default())?;
	let (gl, window) = host.split();

	let report = RenderLoop::new(window, ClearPass::new(gl), LoopDef::default()).run()?;
	log::info!("Presented {} frames", report.frames);

	Ok(())
}
