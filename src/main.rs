fn main() -> anyhow::Result<()> {
    segmentor_lib::run()
}
