use anyhow::Result;
use fisheries_cleaner::cleaner::{CleaningOptions, DatasetCleaner};
use fisheries_cleaner::logging::LoggingContext;
use fisheries_cleaner::pipeline::FisheriesPipeline;
use fisheries_cleaner::table::RecordTable;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const COMM_HEADER: &str =
    "year,area_id,county,county_olelo,species_group,ecosystem_type,exchange_value,exchange_value_formatted\n";
const NONCOMM_HEADER: &str =
    "year,island,island_olelo,county,species_group,ecosystem_type,exchange_value,exchange_value_formatted\n";

fn write_input(dir: &Path, name: &str, header: &str, rows: &[&str]) {
    let mut content = header.to_string();
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(dir.join(name), content).unwrap();
}

/// Ten commercial rows: two with missing values, one aggregate of each kind
fn commercial_rows() -> Vec<&'static str> {
    vec![
        "1997,100,Hawaii,Hawaiʻi,Pelagics,Coastal — Open Ocean,10,$10",
        "1998,100,Hawaii,Hawaiʻi,Pelagics,Coastal — Open Ocean,10,$10",
        "1999,101,Maui,Maui,Deep 7 Bottomfish,Inshore — Reef,10,$10",
        "2000,101,Maui,Maui,Shallow Bottomfish,Inshore — Reef,10,$10",
        "2001,102,Kauai,Kauaʻi,Reef-Associated,Inshore — Reef,10,$10",
        "2002,102,Kauai,Kauaʻi,Reef-Associated,Inshore — Reef,,",
        "2003,103,Honolulu,Honolulu,Pelagics,Coastal — Open Ocean,NA,",
        "2004,103,Honolulu,Honolulu,All Species,Inshore — Reef,20,$20",
        "2005,104,Kalawao,Kalawao,Pelagics,All Ecosystems,15,$15",
        "2006,104,Kalawao,Kalawao,Pelagics,Coastal — Open Ocean,15,$15",
    ]
}

fn non_commercial_rows() -> Vec<&'static str> {
    vec![
        "2005,Oahu,Oʻahu,Honolulu,Herbivores,Inshore — Reef,20,$20",
        "2010,Maui,Maui,Maui,Herbivores,Inshore — Reef,30,$30",
        "2022,Maui,Maui,Maui,Herbivores,All Ecosystems,50,$50",
    ]
}

#[test]
fn null_values_removed_and_aggregates_kept_when_disabled() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("cleaned");
    write_input(dir.path(), "tidied_comm_ev.csv", COMM_HEADER, &commercial_rows());

    let mut cleaner = DatasetCleaner::commercial(dir.path(), &out);
    let options = CleaningOptions {
        remove_aggregates: false,
        remove_display: false,
    };
    let outcome = cleaner.run_pipeline(options);

    assert!(outcome.success());
    let summary = outcome.summary().unwrap();
    assert_eq!(summary.raw_row_count, 10);
    assert_eq!(summary.cleaned_row_count, 8);
    assert_eq!(summary.rows_removed, 2);
    assert_eq!(summary.rows_removed_aggregate, 0);

    let table = RecordTable::from_csv_path(outcome.output_file().unwrap())?;
    assert_eq!(table.len(), 8);
    assert!(table.column("exchange_value").unwrap().all(|v| !v.is_null()));
    assert!(table.has_column("county_olelo"));
    Ok(())
}

#[test]
fn aggregates_and_display_columns_removed_when_enabled() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("cleaned");
    write_input(dir.path(), "tidied_comm_ev.csv", COMM_HEADER, &commercial_rows());

    let mut cleaner = DatasetCleaner::commercial(dir.path(), &out);
    let outcome = cleaner.run_pipeline(CleaningOptions {
        remove_aggregates: true,
        remove_display: true,
    });

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.cleaned_row_count, 6);
    assert_eq!(summary.rows_removed_null + summary.rows_removed_aggregate, summary.rows_removed);

    let table = RecordTable::from_csv_path(outcome.output_file().unwrap())?;
    assert!(table
        .rows()
        .all(|r| r.text("species_group") != Some("All Species") && r.text("ecosystem_type") != Some("All Ecosystems")));
    assert!(!table.has_column("county_olelo"));
    assert!(!table.has_column("exchange_value_formatted"));
    assert!(table.has_column("area_id"));
    Ok(())
}

#[test]
fn out_of_range_year_is_retained() -> Result<()> {
    let dir = tempdir()?;
    write_input(
        dir.path(),
        "tidied_comm_ev.csv",
        COMM_HEADER,
        &["1996,100,Hawaii,Hawaiʻi,Pelagics,Coastal — Open Ocean,500,$500"],
    );

    let mut cleaner = DatasetCleaner::commercial(dir.path(), dir.path().join("cleaned"));
    let outcome = cleaner.run_pipeline(CleaningOptions::default());

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.cleaned_row_count, 1);
    assert_eq!(summary.date_range.unwrap().min_year, 1996);
    assert!(summary.quality_issue_count >= 1);
    Ok(())
}

#[test]
fn non_commercial_aggregate_ecosystems_removed() -> Result<()> {
    let dir = tempdir()?;
    write_input(dir.path(), "tidied_noncomm_ev.csv", NONCOMM_HEADER, &non_commercial_rows());

    let mut cleaner = DatasetCleaner::non_commercial(dir.path(), dir.path().join("cleaned"));
    let outcome = cleaner.run_pipeline(CleaningOptions::default());

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.cleaned_row_count, 2);
    assert_eq!(summary.unique_islands.as_deref(), Some(&["Maui".to_string(), "Oahu".to_string()][..]));
    assert!(!summary.unique_ecosystem_types.contains(&"All Ecosystems".to_string()));

    let output = outcome.output_file().unwrap();
    assert!(output
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("cleaned_noncommercial_"));
    Ok(())
}

#[test]
fn missing_column_fails_one_dataset_but_not_the_other() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("cleaned");
    write_input(
        dir.path(),
        "tidied_comm_ev.csv",
        "year,area_id,county,species_group,ecosystem_type\n",
        &["2000,100,Hawaii,Pelagics,Coastal — Open Ocean"],
    );
    write_input(dir.path(), "tidied_noncomm_ev.csv", NONCOMM_HEADER, &non_commercial_rows());

    let mut pipeline = FisheriesPipeline::new(dir.path(), &out);
    let run = pipeline.run_full_pipeline(&LoggingContext::disabled(), CleaningOptions::default())?;

    assert!(!run.success);
    assert!(run.combined.commercial.is_none());
    assert!(run.combined.non_commercial.is_some());
    assert!(run.combined.overall.is_none());

    let commercial_outputs = fs::read_dir(&out)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("cleaned_commercial_"))
        .count();
    assert_eq!(commercial_outputs, 0);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&run.summary_file)?)?;
    assert!(written["commercial"].is_null());
    assert!(written.get("overall").is_none());
    Ok(())
}

#[test]
fn both_datasets_merge_into_overall_totals() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("cleaned");
    write_input(
        dir.path(),
        "tidied_comm_ev.csv",
        COMM_HEADER,
        &[
            "2000,100,Hawaii,Hawaiʻi,Pelagics,Coastal — Open Ocean,60,$60",
            "2001,101,Maui,Maui,Pelagics,Inshore — Reef,40,$40",
        ],
    );
    write_input(
        dir.path(),
        "tidied_noncomm_ev.csv",
        NONCOMM_HEADER,
        &["2015,Oahu,Oʻahu,Honolulu,Herbivores,Inshore — Reef,50,$50"],
    );

    let mut pipeline = FisheriesPipeline::new(dir.path(), &out);
    let run = pipeline.run_full_pipeline(&LoggingContext::disabled(), CleaningOptions::default())?;

    assert!(run.success);
    let overall = run.combined.overall.as_ref().unwrap();
    assert_eq!(overall.total_exchange_value, 150.0);
    assert_eq!(overall.total_records, 3);
    let range = overall.combined_date_range.unwrap();
    assert_eq!((range.min_year, range.max_year), (2000, 2015));

    let file_name = run.summary_file.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("cleaning_summary_") && file_name.ends_with(".json"));
    Ok(())
}

#[test]
fn infinite_exchange_values_are_removed_as_nulls() -> Result<()> {
    let dir = tempdir()?;
    let out = dir.path().join("cleaned");
    write_input(
        dir.path(),
        "tidied_comm_ev.csv",
        COMM_HEADER,
        &[
            "2000,100,Hawaii,Hawaiʻi,Pelagics,Coastal — Open Ocean,25,$25",
            "2001,101,Maui,Maui,Pelagics,Inshore — Reef,inf,",
            "2002,101,Maui,Maui,Pelagics,Inshore — Reef,-Infinity,",
        ],
    );

    let mut pipeline = FisheriesPipeline::new(dir.path(), &out);
    let run = pipeline.run_full_pipeline(&LoggingContext::disabled(), CleaningOptions::default())?;

    let summary = run.combined.commercial.as_ref().unwrap();
    assert_eq!(summary.cleaned_row_count, 1);
    assert_eq!(summary.rows_removed_null, 2);
    assert_eq!(summary.total_exchange_value, 25.0);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&run.summary_file)?)?;
    assert_eq!(written["commercial"]["total_exchange_value"].as_f64(), Some(25.0));
    Ok(())
}
