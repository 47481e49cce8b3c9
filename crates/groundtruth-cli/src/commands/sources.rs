use groundtruth_core::VariantRegistry;

pub fn list() -> Result<(), groundtruth_core::error::GroundtruthError> {
    let registry = VariantRegistry::builtin();

    println!("Registered sources:\n");
    for tag in registry.tags() {
        let extractor = registry.resolve(tag)?;
        let sidecar = match extractor.sidecar_layout() {
            Some(layout) => format!("sidecar: {layout}"),
            None => "page only".to_string(),
        };
        println!("  {:<10} {}", tag, sidecar);
    }
    Ok(())
}
