use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use surveyor::domain::{
    Field, FieldDefaults, FieldOption, FieldType, FieldValue, OptionSet, OptionSetKind, Section, Subsection,
    SurveyConfig,
};
use surveyor::form::{descriptive_responses, validate, FormStateStore};
use surveyor::resolver::{resolve_field_defaults, resolve_options, InMemoryOptionSetCache};
use surveyor::transfer::{import_str, to_json_string};

const SECTIONS: u32 = 20;
const FIELDS_PER_SECTION: u32 = 25;

fn large_survey() -> SurveyConfig {
    let mut survey = SurveyConfig::with_id("bench", "Benchmark survey");
    for s in 0..SECTIONS {
        let mut section = Section::new(format!("s{s}"), format!("Section {s}"), s);
        for f in 0..FIELDS_PER_SECTION {
            let field = if f % 3 == 0 {
                Field::new(format!("s{s}f{f}"), FieldType::Rating, format!("Question {f}")).with_option_set("rs1")
            } else {
                Field::new(format!("s{s}f{f}"), FieldType::Text, format!("Question {f}")).required()
            };
            section = section.with_field(field);
        }
        survey = survey.with_section(section);
    }
    survey
}

fn filled_store(survey: &SurveyConfig) -> FormStateStore {
    let mut store = FormStateStore::new();
    for (_, field) in survey.fields_in_order() {
        store.set_field_value(field.id.clone(), FieldValue::text("answer"));
    }
    store
}

fn benchmark_default_resolution(c: &mut Criterion) {
    let section = Section::new("s1", "Preferences", 0).with_defaults(FieldDefaults::for_type(FieldType::Radio));
    let subsection = Subsection::new("sub1", "Colours").with_defaults(FieldDefaults::for_type(FieldType::MultiSelect));

    c.bench_function("resolve_field_defaults", |b| {
        b.iter(|| resolve_field_defaults(black_box(&section), black_box(Some(&subsection))))
    });
}

fn benchmark_option_resolution(c: &mut Criterion) {
    let scale = OptionSet::new(OptionSetKind::Rating, "rs1", "Scale").with_options(
        (1..=10)
            .map(|i| FieldOption::new(format!("Level {i}"), i.to_string()))
            .collect(),
    );
    let cache = InMemoryOptionSetCache::with_loaded([scale]);
    let field = Field::new("f", FieldType::Rating, "Rate").with_option_set("rs1");

    c.bench_function("resolve_options_loaded", |b| {
        b.iter(|| resolve_options(black_box(&field), &cache))
    });
}

fn benchmark_submission(c: &mut Criterion) {
    let survey = large_survey();
    let store = filled_store(&survey);

    let mut group = c.benchmark_group("submission");
    group.throughput(Throughput::Elements(u64::from(SECTIONS * FIELDS_PER_SECTION)));
    group.bench_function("validate", |b| b.iter(|| validate(black_box(&survey), black_box(&store))));
    group.bench_function("descriptive_responses", |b| {
        b.iter(|| descriptive_responses(black_box(&survey), black_box(&store)))
    });
    group.finish();
}

fn benchmark_initialize(c: &mut Criterion) {
    let survey = large_survey();
    let cache = Arc::new(InMemoryOptionSetCache::new());

    c.bench_function("form_initialize", |b| {
        b.iter(|| {
            let mut store = FormStateStore::new();
            store.initialize(black_box(&survey), cache.as_ref());
            store
        })
    });
}

fn benchmark_transfer(c: &mut Criterion) {
    let json = to_json_string(&large_survey()).unwrap();

    c.bench_function("import_document", |b| b.iter(|| import_str(black_box(&json)).unwrap()));
}

criterion_group!(
    benches,
    benchmark_default_resolution,
    benchmark_option_resolution,
    benchmark_submission,
    benchmark_initialize,
    benchmark_transfer
);
criterion_main!(benches);
