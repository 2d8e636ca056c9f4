fn main() -> eframe::Result<()> {
    env_logger::init();
    reading_graph::native::run()
}
