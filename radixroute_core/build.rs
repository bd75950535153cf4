fn main() {
    use std::env;
    use std::path::PathBuf;

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = crate_dir.join("include");
    std::fs::create_dir_all(&out_dir).expect("Failed to create include directory");

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .expect("Failed to read cbindgen.toml");

    // Only the FFI surface is parsed; the generic tree types never cross the ABI.
    let sources = [
        "src/errors.rs",
        "src/handle_registry.rs",
        "src/public_api.rs",
        "src/telemetry.rs",
    ];
    let mut builder = cbindgen::Builder::new().with_config(config);
    for src in sources {
        println!("cargo:rerun-if-changed={src}");
        builder = builder.with_src(crate_dir.join(src));
    }
    println!("cargo:rerun-if-changed=cbindgen.toml");

    builder
        .generate()
        .expect("Unable to generate bindings")
        .write_to_file(out_dir.join("radixroute.h"));
}
