//! Example: Basic inventory workflow
//!
//! This example adds a handful of assets, filters and pages through them,
//! bulk-deletes a selection and writes a QR print sheet.
//!
//! Run with: cargo run --example basic_inventory

use assetstore::{AssetInput, AssetListController, AssetLocation, AssetStatus, FormMode, QrOptions, Store};
use eyre::Result;

fn main() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let store_path = temp_dir.path().to_path_buf();

    println!("AssetStore Inventory Example");
    println!("============================\n");

    let store = Store::open(&store_path)?;
    let mut controller = AssetListController::new(store);
    controller.refresh()?;

    // Add sample assets
    println!("Adding sample assets...\n");
    let samples = [
        ("Yamaha keyboard", AssetStatus::InUse, Some(AssetLocation::Stage), Some(12_500_000.0)),
        ("Shure SM58 microphone", AssetStatus::InUse, Some(AssetLocation::Cabinet), Some(1_500_000.0)),
        ("Drum throne", AssetStatus::Damaged, Some(AssetLocation::Stage), None),
        ("Spare XLR cables", AssetStatus::NotInUse, Some(AssetLocation::Box), Some(350_000.0)),
        ("Projector", AssetStatus::UnderRepair, None, Some(7_800_000.0)),
    ];
    for (name, status, location, price) in samples {
        let mut input = AssetInput::new(name, status);
        input.location = location;
        input.price = price;
        controller.save(FormMode::Add, &input)?;
    }

    // Invalid input is rejected before it reaches the store
    println!("Saving an asset without a name...");
    if let Err(e) = controller.save(FormMode::Add, &AssetInput::new("  ", AssetStatus::InUse)) {
        println!("  rejected: {}\n", e);
    }

    let stats = controller.stats();
    println!("Dashboard: {} assets", stats.total);
    for status in AssetStatus::ALL {
        println!("  {:<14} {}", status.label(), stats.count(status));
    }
    println!();

    // Filter by location
    println!("Assets on stage:");
    controller.set_location_filter(Some(AssetLocation::Stage));
    for asset in controller.view().page.items {
        println!("  - {} ({})", asset.name, asset.status.label());
    }
    controller.set_location_filter(None);
    println!();

    // Search
    println!("Search \"xlr\":");
    controller.set_search("xlr");
    for asset in controller.view().page.items {
        println!("  - {}", asset.name);
    }
    controller.set_search("");
    println!();

    // Select everything on the page and print labels
    controller.toggle_all();
    let sheet = controller.print_selected(QrOptions { size: 150, ..QrOptions::default() })?;
    let sheet_path = store_path.join("labels.svg");
    std::fs::write(&sheet_path, sheet)?;
    println!("Wrote {} labels to {}\n", controller.selection().len(), sheet_path.display());
    controller.clear_selection();

    // Bulk delete the damaged and unused items
    controller.set_status_filter(Some(AssetStatus::Damaged));
    controller.toggle_all();
    let deleted = controller.delete_selected()?;
    println!("Deleted {} damaged asset(s)", deleted);
    controller.set_status_filter(None);

    println!("Remaining: {} assets", controller.view().filtered_count);
    if let Some(toast) = controller.notifier().latest() {
        println!("Last notification: {}", toast.message);
    }

    Ok(())
}
