// Property tests over generated batches

pub mod common;

use common::{generate, generate_source};
use dtogen::generate::{AssignedValue, Direction, ImportAggregator};
use dtogen::{Import, Namespace};
use quickcheck::{TestResult, quickcheck};

/// Plain members cross unchanged in both directions, whatever their number and optionality.
#[test]
fn prop_plain_members_round_trip() {
    fn prop(optional: Vec<bool>) -> TestResult {
        if optional.len() > 16 {
            return TestResult::discard();
        }
        let fields: String = optional
            .iter()
            .enumerate()
            .map(|(i, optional)| {
                let ty = if *optional { "Option<String>" } else { "u32" };
                format!("pub field_{i}: {ty},")
            })
            .collect();
        let source = format!("#[has_dto] pub struct Model {{ {fields} }}");

        let output = generate_source("models", &source);
        let Some(dto) = output.declaration("ModelDTO") else {
            return TestResult::failed();
        };
        let round_trips = [Direction::ToDerived, Direction::ToModel].iter().all(|direction| {
            dto.helper(*direction).is_some_and(|helper| {
                helper.assignments.len() == optional.len()
                    && helper
                        .assignments
                        .iter()
                        .all(|assignment| assignment.value == AssignedValue::Copy)
            })
        });
        TestResult::from_bool(round_trips)
    }
    quickcheck(prop as fn(Vec<bool>) -> TestResult);
}

/// Aggregation keeps first-seen order, never repeats an import and never admits a reserved one.
#[test]
fn prop_import_aggregation_is_first_seen() {
    fn prop(picks: Vec<u8>) -> bool {
        const PATHS: [&str; 5] = ["pkg::A", "pkg::B", "crate::gen::ADTO", "std::fmt", "pkg::A as Alias"];
        let imports: Vec<Import> = picks
            .iter()
            .map(|pick| Import::new(PATHS[*pick as usize % PATHS.len()]))
            .collect();

        let mut aggregator = ImportAggregator::new(Namespace::parse("gen").absolute_segments());
        aggregator.extend(&imports);

        let mut expected: Vec<&Import> = Vec::new();
        for import in &imports {
            if !import.as_str().starts_with("crate::gen") && !expected.contains(&import) {
                expected.push(import);
            }
        }

        // Re-adding in reverse never reorders or grows the set
        let before = aggregator.imports().to_vec();
        aggregator.extend(imports.iter().rev());

        aggregator.imports().iter().eq(expected.iter().copied()) && aggregator.imports() == before
    }
    quickcheck(prop as fn(Vec<u8>) -> bool);
}

/// Output depends only on the batch, not on how many times it is generated.
#[test]
fn prop_generation_is_deterministic() {
    fn prop(count: u8) -> bool {
        let count = usize::from(count % 6) + 1;
        let source: String = (0..count)
            .map(|i| format!("#[has_dto(conversion = Explicit | StaticMethods)] pub struct M{i} {{ pub id: u64 }}\n"))
            .collect();
        let declarations = common::declarations("models", &source);
        generate(&declarations).source == generate(&declarations).source
    }
    quickcheck(prop as fn(u8) -> bool);
}
