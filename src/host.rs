//! Build-script entry points
//!
//! Glue between a Cargo build script and a generation pass: discover the
//! crate's sources, run the pass, write the output file and report back to
//! Cargo.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::config::GeneratorConfig;
use crate::discovery::discover_dir;
use crate::error::Diagnostic;
use crate::orchestrator::{GenerationOutput, Generator};

/// Outcome of [`generate_from_dir`].
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output: GenerationOutput,
    /// Every source file visited, for `rerun-if-changed`.
    pub files: Vec<PathBuf>,
    /// The file written.
    pub written: PathBuf,
}

impl BuildReport {
    /// Discovery and generation diagnostics together.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.output.diagnostics
    }
}

/// Generate `config.output_file` in `out_dir` from every tagged struct under `src_dir`.
///
/// Files that cannot be read or parsed are skipped with a warning (the
/// compiler reports them properly if they belong to the crate), declarations
/// that fail become error diagnostics; the output file is written regardless. Only I/O on the
/// directories themselves and an invalid configuration fail the call.
///
/// ```no_run
/// // build.rs
/// fn main() -> anyhow::Result<()> {
///     let out_dir = std::env::var("OUT_DIR")?;
///     let report = dtogen::generate_from_dir("src", out_dir, &Default::default())?;
///     dtogen::emit_cargo_directives(&report);
///     Ok(())
/// }
/// ```
pub fn generate_from_dir(
    src_dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &GeneratorConfig,
) -> Result<BuildReport> {
    let src_dir = src_dir.as_ref();
    let out_dir = out_dir.as_ref();

    // DtoGenError holds spans, which are not Send; keep only the message
    let generator = Generator::new(config.clone()).map_err(|e| anyhow!("{e}"))?;

    let discovery = discover_dir(src_dir)?;
    log::debug!(
        "discovered {} tagged struct(s) in {} file(s)",
        discovery.declarations.len(),
        discovery.files.len()
    );

    let mut output = generator.run(&discovery.declarations);
    // Unreadable files come first, then the pass's own diagnostics
    let mut diagnostics: Vec<Diagnostic> = discovery
        .errors
        .iter()
        .map(|error| Diagnostic::warning(error, None))
        .collect();
    diagnostics.append(&mut output.diagnostics);
    output.diagnostics = diagnostics;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let written = out_dir.join(&config.output_file);
    fs::write(&written, &output.source)
        .with_context(|| format!("failed to write {}", written.display()))?;
    log::info!("wrote {}", written.display());

    Ok(BuildReport {
        output,
        files: discovery.files,
        written,
    })
}

/// Print Cargo directives for `report` on stdout.
pub fn emit_cargo_directives(report: &BuildReport) {
    let stdout = io::stdout();
    if let Err(e) = write_cargo_directives(report, &mut stdout.lock()) {
        log::warn!("failed to emit cargo directives: {e}");
    }
}

/// `cargo:rerun-if-changed` for every visited file, `cargo:warning` for every diagnostic.
pub fn write_cargo_directives(report: &BuildReport, out: &mut impl Write) -> io::Result<()> {
    for file in &report.files {
        writeln!(out, "cargo:rerun-if-changed={}", file.display())?;
    }
    for diagnostic in report.diagnostics() {
        // A directive ends at the newline
        let message = diagnostic.to_string().replace('\n', " ");
        writeln!(out, "cargo:warning={message}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, source: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }

    #[test]
    fn test_generate_from_dir_writes_output() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(src.path(), "lib.rs", "pub mod models;\n");
        write(
            src.path(),
            "models/mod.rs",
            r#"
                #[has_dto(name = "[class]Dto")]
                pub struct User { pub id: u64 }
            "#,
        );
        write(src.path(), "broken.rs", "pub struct {");

        let report = generate_from_dir(src.path(), out.path(), &GeneratorConfig::default()).unwrap();

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.written, out.path().join("dtogen.rs"));
        assert_eq!(report.diagnostics().len(), 1);
        assert_eq!(report.diagnostics()[0].severity, Severity::Warning);
        assert!(report.diagnostics()[0].message.contains("broken.rs"));
        assert!(!report.output.has_errors());

        let written = fs::read_to_string(&report.written).unwrap();
        assert_eq!(written, report.output.source);
        assert!(written.contains("pub mod models {"));
        assert!(written.contains("pub struct UserDto {"));
    }

    #[test]
    fn test_cargo_directives() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(
            src.path(),
            "lib.rs",
            "#[has_dto]\n#[has_dto]\npub struct Twice { pub id: u8 }\n",
        );

        let report = generate_from_dir(src.path(), out.path(), &GeneratorConfig::default()).unwrap();
        let mut buffer = Vec::new();
        write_cargo_directives(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("cargo:rerun-if-changed="));
        assert!(lines[0].ends_with("lib.rs"));
        assert!(lines[1].starts_with("cargo:warning=error: "));
        assert!(lines[1].contains("Twice"));
    }

    #[test]
    fn test_missing_source_dir_fails() {
        let out = TempDir::new().unwrap();
        let missing = out.path().join("no-such-dir");
        assert!(generate_from_dir(&missing, out.path(), &GeneratorConfig::default()).is_err());
    }
}
