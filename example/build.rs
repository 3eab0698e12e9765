// Generates the DTOs of the sample models into OUT_DIR
fn main() -> anyhow::Result<()> {
    let out_dir = std::env::var("OUT_DIR")?;
    let report = dtogen::generate_from_dir("src", out_dir, &Default::default())?;
    dtogen::emit_cargo_directives(&report);
    Ok(())
}
