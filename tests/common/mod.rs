// Shared fixtures for the integration tests

#![allow(dead_code)]

use dtogen::{GenerationOutput, Generator, GeneratorConfig, ModelDeclaration, Namespace};
use dtogen::discovery::discover_source;

/// Install a test logger once; `RUST_LOG=debug` shows the generator's logs.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Declarations of `source`, treated as the contents of module `namespace`.
pub fn declarations(namespace: &str, source: &str) -> Vec<ModelDeclaration> {
    discover_source(source, Namespace::parse(namespace), None).expect("fixture parses")
}

pub fn generate(declarations: &[ModelDeclaration]) -> GenerationOutput {
    init_logger();
    Generator::new(GeneratorConfig::default())
        .expect("default config is valid")
        .run(declarations)
}

pub fn generate_source(namespace: &str, source: &str) -> GenerationOutput {
    generate(&declarations(namespace, source))
}
