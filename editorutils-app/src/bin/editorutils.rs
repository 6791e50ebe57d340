pub fn main() -> anyhow::Result<()> {
    editorutils_app::app::launch()
}
