fn main() -> anyhow::Result<()> {
    pollster::block_on(house_scene::run())
}
