use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let header = crate_dir.join("include").join("vision.h");

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("VISION_H")
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        // Header generation must not break the library build
        Err(e) => println!("cargo:warning=cbindgen failed: {}", e),
    }
}
