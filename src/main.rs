fn main() -> anyhow::Result<()> {
    dreamshelf::cli::run()
}
