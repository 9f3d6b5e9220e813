use std::path::PathBuf;

fn main() {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    if let Err(e) = particle_viewer::core::Engine::run(config_path.as_deref()) {
        eprintln!("Viewer failed: {}", e);
        std::process::exit(1);
    }
}
