//! Integration tests for the Catalog public interface.
//!
//! These tests drive the catalog the way a front end would: through the
//! async facade only.

use catalog_core::{Catalog, CatalogError, EnginePhase, Record, SuggestField};
use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

async fn open_catalog(temp_dir: &TempDir) -> Catalog {
    Catalog::builder(temp_dir.path().join("catalog"))
        .with_background_refresh(false)
        .build()
        .await
        .expect("catalog should open")
}

fn record(name: &str, description: &str) -> Record {
    Record::draft(
        name,
        description,
        "https://example.org/data",
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )
}

async fn search_ids(catalog: &Catalog, query: &str) -> Vec<String> {
    catalog
        .search(query, 10)
        .await
        .into_iter()
        .map(|hit| hit.id)
        .collect()
}

async fn assert_consistent(catalog: &Catalog) {
    let report = catalog.verify().await.unwrap();
    assert!(report.is_consistent(), "{report:?}");
    assert_eq!(report.store_count, report.index_count);
}

#[tokio::test]
async fn test_weather_save_search_delete() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let id = catalog
        .save(
            Some("a".to_string()),
            record("Global Weather Stations 2024", "Daily weather observations"),
        )
        .await
        .unwrap();
    assert_eq!(id, "a");
    assert_eq!(search_ids(&catalog, "weather").await, vec!["a"]);

    catalog.delete("a").await.unwrap();
    assert!(search_ids(&catalog, "weather").await.is_empty());

    let report = catalog.verify().await.unwrap();
    assert_eq!(report.index_count, 0);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_project_filter_selects_one_record() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let gideon = catalog
        .save(None, record("Rainfall", "Monthly totals").with_projects(["Gideon"]))
        .await
        .unwrap();
    catalog
        .save(None, record("Soil", "Moisture probes").with_projects(["Atlas"]))
        .await
        .unwrap();

    assert_eq!(search_ids(&catalog, "project:Gideon").await, vec![gideon]);
}

#[tokio::test]
async fn test_case_variants_return_identical_ranking() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;
    catalog
        .save(None, record("MODIS Land Cover", "Annual land cover from MODIS"))
        .await
        .unwrap();

    let mut rankings = Vec::new();
    for query in ["MODIS", "modis", "Modis"] {
        let hits = catalog.search(query, 10).await;
        assert_eq!(hits.len(), 1, "{query}");
        rankings.push((hits[0].id.clone(), hits[0].score));
    }
    assert_eq!(rankings[0], rankings[1]);
    assert_eq!(rankings[1], rankings[2]);
}

#[tokio::test]
async fn test_empty_query_browses_most_recently_updated_first() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    for name in ["First", "Second", "Third"] {
        catalog.save(None, record(name, "x")).await.unwrap();
    }
    // Editing moves a record to the front.
    catalog
        .save(Some("first".to_string()), record("First", "edited"))
        .await
        .unwrap();

    let ids = search_ids(&catalog, "").await;
    assert_eq!(ids, vec!["first", "third", "second"]);
    assert_eq!(search_ids(&catalog, "").await, ids);
}

#[tokio::test]
async fn test_round_trip_preserves_record() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let original = record("Ocean Buoys", "Hourly sea surface temperature")
        .with_file_format("NetCDF")
        .with_data_types(["time-series", "geospatial"])
        .with_projects(["Blue Water"])
        .with_extra("license", json!("CC-BY-4.0"))
        .with_extra("size_gb", json!(12.5));

    let id = catalog.save(None, original.clone()).await.unwrap();
    let stored = catalog.get(&id).await.unwrap().unwrap();
    assert_eq!(stored, original.with_id(id));
}

#[tokio::test]
async fn test_generated_ids_do_not_collide() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let first = catalog.save(None, record("Air Quality", "x")).await.unwrap();
    let second = catalog.save(None, record("Air Quality", "y")).await.unwrap();
    let third = catalog.save(None, record("Air Quality", "z")).await.unwrap();

    assert_eq!(first, "air-quality");
    assert_eq!(second, "air-quality-2");
    assert_eq!(third, "air-quality-3");
    assert_eq!(catalog.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_invalid_save_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let err = catalog
        .save_json(json!({
            "id": "bad",
            "name": "Broken",
            "description": "d",
            "source": "s",
            "date_created": "15/01/2024"
        }))
        .await
        .unwrap_err();

    match err {
        CatalogError::Validation { id, field, .. } => {
            assert_eq!(id.as_deref(), Some("bad"));
            assert_eq!(field, "date_created");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(catalog.count().await.unwrap(), 0);
    assert_consistent(&catalog).await;
}

#[tokio::test]
async fn test_delete_missing_record_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let err = catalog.delete("nope").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { ref id } if id == "nope"));
}

#[tokio::test]
async fn test_store_and_index_stay_consistent() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    let mut ids = Vec::new();
    for i in 0..6 {
        let id = catalog
            .save(None, record(&format!("Series {i}"), "x"))
            .await
            .unwrap();
        ids.push(id);
        assert_consistent(&catalog).await;
    }
    for id in ids.iter().step_by(2) {
        catalog.delete(id).await.unwrap();
        assert_consistent(&catalog).await;
    }
    assert_eq!(catalog.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;
    for name in ["Alpha", "Beta", "Gamma"] {
        catalog.save(None, record(name, "weather data")).await.unwrap();
    }

    let first = catalog.reindex_all().await.unwrap();
    let ranked_first = catalog.search("weather", 10).await;
    let second = catalog.reindex_all().await.unwrap();
    let ranked_second = catalog.search("weather", 10).await;

    assert_eq!(first.success_count, 3);
    assert!(first.is_clean());
    assert_eq!(first, second);
    assert_eq!(ranked_first, ranked_second);
    assert_consistent(&catalog).await;
}

#[tokio::test]
async fn test_background_reindex_completes() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;
    catalog.save(None, record("Alpha", "x")).await.unwrap();

    let handle = catalog.start_reindex();
    let report = handle.wait().await.unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(search_ids(&catalog, "alpha").await, vec!["alpha"]);
}

#[tokio::test]
async fn test_suggestions_rank_prefix_matches_first() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;

    for projects in [
        vec!["climate-ml"],
        vec!["climate-analysis"],
        vec!["healthcare-climate"],
    ] {
        catalog
            .save(None, record("Data", "x").with_projects(projects))
            .await
            .unwrap();
    }
    catalog.refresh_suggestions().await.unwrap();

    let suggestions = catalog.suggest(SuggestField::Project, "clim", 10);
    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[2], "healthcare-climate");
    let mut leading = suggestions[..2].to_vec();
    leading.sort();
    assert_eq!(leading, vec!["climate-analysis", "climate-ml"]);
}

#[tokio::test]
async fn test_export_import_restores_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let backup = temp_dir.path().join("backup.json");

    let original = open_catalog(&temp_dir).await;
    original
        .save(None, record("Global Weather", "Daily observations").with_projects(["Gideon"]))
        .await
        .unwrap();
    original.save(None, record("Soil Moisture", "Weekly")).await.unwrap();
    assert_eq!(original.export_json(&backup).await.unwrap(), 2);
    original.shutdown().await.unwrap();
    drop(original);

    let restored = Catalog::builder(temp_dir.path().join("restored"))
        .with_background_refresh(false)
        .build()
        .await
        .unwrap();
    let report = restored.import_json(&backup).await.unwrap();
    assert_eq!(report.imported_count, 2);
    assert!(report.errors.is_empty());

    assert_eq!(search_ids(&restored, "project:gideon").await, vec!["global-weather"]);
    assert_consistent(&restored).await;
}

#[tokio::test]
async fn test_reopen_keeps_records_and_index() {
    let temp_dir = TempDir::new().unwrap();
    {
        let catalog = open_catalog(&temp_dir).await;
        catalog.save(None, record("Persistent", "x")).await.unwrap();
        catalog.shutdown().await.unwrap();
    }

    let catalog = open_catalog(&temp_dir).await;
    assert_eq!(search_ids(&catalog, "persistent").await, vec!["persistent"]);
}

#[tokio::test]
async fn test_second_open_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let _catalog = open_catalog(&temp_dir).await;

    let second = Catalog::builder(temp_dir.path().join("catalog"))
        .with_background_refresh(false)
        .build()
        .await;
    assert!(matches!(second, Err(CatalogError::Store { .. })));
}

#[tokio::test]
async fn test_status_reports_counts() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;
    catalog.save(None, record("Alpha", "x")).await.unwrap();

    let status = catalog.status().await.unwrap();
    assert_eq!(status.record_count, 1);
    assert_eq!(status.index_count, 1);
    assert_eq!(status.autocomplete, EnginePhase::Ready);
    assert!(status.root.ends_with("catalog"));
}

#[tokio::test]
async fn test_superseded_search_is_discarded() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;
    catalog.save(None, record("Weather", "x")).await.unwrap();

    let first = catalog.search_latest("wea", 10);
    let second = catalog.search_latest("weather", 10);

    assert!(first.await.is_none());
    assert_eq!(second.await.map(|hits| hits.len()), Some(1));

    let alone = catalog.search_latest("weath", 10).await;
    assert_eq!(alone.map(|hits| hits.len()), Some(1));
}

#[tokio::test]
async fn test_typing_a_word_keeps_it_matched() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = open_catalog(&temp_dir).await;
    let id = catalog
        .save(None, record("Population census", "Precipitation observations"))
        .await
        .unwrap();

    for word in ["population", "precipitation", "observations"] {
        for n in 2..=word.len() {
            let typed = &word[..n];
            assert_eq!(search_ids(&catalog, typed).await, vec![id.clone()], "typed {typed:?}");
        }
    }
}
