use fisheries_cleaner::cleaner::CleaningOptions;
use fisheries_cleaner::logging::LoggingContext;
use fisheries_cleaner::pipeline::FisheriesPipeline;
use fisheries_cleaner::summary::CombinedSummary;
use jsonschema::JSONSchema;
use serde_json::json;
use std::fs;

fn compiled_schema() -> JSONSchema {
    let schema = include_str!("../schemas/cleaning_summary.v1.json");
    let schema_json: serde_json::Value = serde_json::from_str(schema).unwrap();
    let schema_static: &'static serde_json::Value = Box::leak(Box::new(schema_json));
    JSONSchema::options().compile(schema_static).unwrap()
}

#[test]
fn partial_summary_example_is_valid() {
    let compiled = compiled_schema();
    let instance: serde_json::Value =
        serde_json::from_str(include_str!("resources/summary_partial.json")).unwrap();
    assert!(compiled.is_valid(&instance));

    // The example also deserializes into the library type
    let parsed: CombinedSummary = serde_json::from_value(instance).unwrap();
    assert!(parsed.overall.is_none());
    assert_eq!(parsed.non_commercial.unwrap().records_by_year.get(&2010), Some(&1));
}

#[test]
fn overall_block_requires_totals() {
    let compiled = compiled_schema();
    let mut invalid: serde_json::Value =
        serde_json::from_str(include_str!("resources/summary_partial.json")).unwrap();
    invalid["overall"] = json!({ "total_records": 2 });

    assert!(!compiled.is_valid(&invalid), "overall without totals should fail");
}

#[test]
fn exported_summary_matches_schema() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("tidied_comm_ev.csv"),
        "year,area_id,county,species_group,ecosystem_type,exchange_value\n\
         2000,100,Hawaii,Pelagics,Coastal — Open Ocean,100\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("tidied_noncomm_ev.csv"),
        "year,island,county,species_group,ecosystem_type,exchange_value\n\
         2010,Oahu,Honolulu,Herbivores,Inshore — Reef,50\n",
    )
    .unwrap();

    let mut pipeline = FisheriesPipeline::new(dir.path(), dir.path().join("cleaned"));
    let run = pipeline
        .run_full_pipeline(&LoggingContext::disabled(), CleaningOptions::default())
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&run.summary_file).unwrap()).unwrap();
    let compiled = compiled_schema();
    assert!(compiled.is_valid(&written));
    assert_eq!(written["overall"]["total_exchange_value"], json!(150.0));
}
