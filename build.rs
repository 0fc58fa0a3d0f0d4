fn main() {
    // Link to IOKit and CoreFoundation frameworks on macOS (system sleep request)
    if cfg!(target_os = "macos") {
        println!("cargo:rustc-link-lib=framework=IOKit");
        println!("cargo:rustc-link-lib=framework=CoreFoundation");
    }
}
