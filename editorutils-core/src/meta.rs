pub const NAME: &str = "editorutils";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
