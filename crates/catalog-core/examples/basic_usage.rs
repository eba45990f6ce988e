//! Basic usage example - add a dataset and search for it

use catalog_core::{Catalog, Record, Result, SuggestField};
use chrono::NaiveDate;

#[tokio::main]
async fn main() -> Result<()> {
    // Get path from args or use a local directory
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./example-catalog".to_string());
    let query = std::env::args().nth(2).unwrap_or_else(|| "weather".to_string());

    println!("Opening catalog at: {}", path);
    let catalog = Catalog::builder(&path).auto_create_dirs(true).build().await?;

    if catalog.count().await? == 0 {
        let record = Record::draft(
            "Global Weather Stations 2024",
            "Daily weather observations from surface stations",
            "https://example.org/weather.csv",
            NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date"),
        )
        .with_file_format("csv")
        .with_data_types(["time series", "tabular"])
        .with_projects(["Gideon"]);
        let id = catalog.save(None, record).await?;
        println!("Added sample dataset {}", id);
        catalog.refresh_suggestions().await?;
    }

    let hits = catalog.search(&query, 10).await;
    if hits.is_empty() {
        println!("No datasets match {:?}.", query);
    } else {
        println!("Found {} datasets:", hits.len());
        for hit in hits {
            println!("  - {} ({}) {}", hit.name, hit.id, hit.snippet);
        }
    }

    println!(
        "Data types in use: {:?}",
        catalog.suggest(SuggestField::Type, "", 10)
    );

    catalog.shutdown().await
}
