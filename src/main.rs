use std::sync::Arc;

use log::LevelFilter;
use voxel::{
    abs::{App, Callbacks, SdlSurface, Vertex, verify_primitive_sizes},
    config::{CONFIG_PATH, Config},
    logging,
    scene::{self, Scene},
};

fn main() {
    let config = Config::load(CONFIG_PATH);
    let level = config.as_ref().map_or(LevelFilter::Info, |config| config.log_level);
    if let Err(e) = logging::init(level) {
        eprintln!("{e}");
    }

    if let Err(e) = config.and_then(|config| run(&config)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> voxel::Result<()> {
    Vertex::verify_layout()?;
    verify_primitive_sizes()?;

    let surface = SdlSurface::new(&config.title, config.width, config.height, config.vsync)?;
    let gl = Arc::clone(&surface.gl);
    let mut app = App::new(
        surface,
        &config.title,
        config.clear_color,
        Callbacks::simple(scene::draw),
    );

    let scene = Scene::new(&gl, config)?;
    let scene = app.start(scene);
    log::info!("scene ran for {:.2} time units", scene.time());

    // Device objects go before the context that owns them.
    drop(scene);
    drop(gl);
    app.destroy();
    Ok(())
}
