fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

    // Server for the service itself, client for integration tests and callers
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("interview_descriptor.bin"))
        .compile_protos(&["../proto/interview/v1/interview.proto"], &["../proto"])?;

    println!("cargo:rerun-if-changed=../proto/interview/v1/interview.proto");

    Ok(())
}
