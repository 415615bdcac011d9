mod app;
mod config;
mod fps;
mod input;
mod render;
mod sprite;
mod text;
mod texture;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = pollster::block_on(app::run()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
