// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic collection-registry usage example.
//!
//! Demonstrates:
//! 1. Writing documents through a `SmartWriter`
//! 2. Listing the collections the registry knows about
//! 3. Manually adding a collection from an admin view
//! 4. Running the connectivity test
//! 5. Displaying metrics
//!
//! Runs entirely in memory.
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::sync::Arc;

use collection_registry::{
    DocumentAdmin, Diagnostics, InMemoryStore, RegistryConfig, SetOptions, SmartWriter,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║        collection-registry: Basic Usage Example               ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Write a few documents
    // ─────────────────────────────────────────────────────────────────────────
    let config = RegistryConfig::default();
    let store = Arc::new(InMemoryStore::new());
    let writer = SmartWriter::new(store.clone(), &config);

    println!("📝 Writing documents...");
    let entries = vec![
        ("orders", json!({"total": 42, "currency": "EUR"})),
        ("customers", json!({"name": "Ada"})),
        ("orders", json!({"total": 7, "currency": "EUR"})),
    ];
    for (collection, data) in entries {
        let written = writer.add_doc(collection, data).await?;
        println!("   └─ {}", written.doc_ref);
        written.registration.settled().await;
    }
    writer
        .set_doc("users", "alice", json!({"role": "admin"}), SetOptions::default())
        .await?
        .registration
        .settled()
        .await;
    println!("   └─ users/alice");

    // ─────────────────────────────────────────────────────────────────────────
    // 2. What does the registry know?
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📚 Registered collections:");
    let registered = writer.registry().get_registered_collections().await;
    for name in &registered.collections {
        println!("   └─ {}", name);
    }
    println!("\n📚 Known collections (defaults + registered):");
    for name in writer.registry().list_known_collections().await {
        println!("   └─ {}", name);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Admin view: manual add
    // ─────────────────────────────────────────────────────────────────────────
    let admin = DocumentAdmin::new(writer.clone());
    let mut view = admin.known_collections().await;
    if let Some(task) = view.add_manual(admin.registry(), "drafts") {
        task.settled().await;
    }
    println!("\n🗂️  Admin view after adding 'drafts': {:?}", view.names());
    println!("   └─ orders has {} document(s)", admin.fetch_documents("orders").await?.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Connectivity test
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔌 Testing connectivity...");
    let diagnostics = Diagnostics::new(writer.clone(), &config);
    let report = diagnostics.test_connection("demo-user").await;
    println!("   └─ {}", serde_json::to_string_pretty(&report)?);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Dump raw metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

fn dump_metrics(snapshotter: &Snapshotter) {
    let mut rows: Vec<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _unit, _desc, value)| {
            let (_kind, key) = composite_key.into_parts();
            let labels: Vec<String> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
            let value = match value {
                DebugValue::Counter(c) => format!("{}", c),
                DebugValue::Gauge(g) => format!("{:.2}", g.into_inner()),
                DebugValue::Histogram(h) => format!("{} samples", h.len()),
            };
            format!("{}{{{}}} = {}", key.name(), labels.join(","), value)
        })
        .collect();
    rows.sort();
    for row in rows {
        println!("   └─ {}", row);
    }
}
