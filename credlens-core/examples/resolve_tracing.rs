//! Example demonstrating fallback-chain and scanner tracing instrumentation.
//!
//! Run with: cargo run -p credlens-core --example resolve_tracing

use std::sync::Arc;
use std::time::Duration;

use credlens_core::{
    FrameCaptureScanner, Manifest, MockManifestReader, MockRegistryLookup, MockVideoSource,
    MockWatermarkProbe, ProvenanceResolver, ProvenanceResult, Resolution, ScannerConfig,
    VideoSource, WatermarkInfo,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("credlens_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Credlens Resolution Demo ===\n");

    let record = serde_json::json!({
        "claim_generator": "Articulator.ai/1.0",
        "signature_info": { "issuer": "Credlens Registry", "time": "2026-02-01T12:00:00Z" },
        "assertions": []
    });
    let registered = Manifest::from_registry_record(&record).expect("demo record normalizes");

    let watermark = WatermarkInfo {
        present: true,
        secret: "abc123".to_string(),
        schema: "v1".to_string(),
    };

    // No embedded credential, watermark resolves through the registry
    let resolver = ProvenanceResolver::new(
        MockManifestReader::miss(),
        MockWatermarkProbe::hit(watermark.clone()),
        MockRegistryLookup::hit(registered),
    );

    println!("Resolving a watermarked image...\n");

    match resolver.resolve(b"demo image bytes", "image/png").await {
        Resolution::Settled(ProvenanceResult::Embedded(manifest)) => {
            println!("\n✅ Embedded credential: {:?}", manifest.claim_generator);
        }
        Resolution::Settled(ProvenanceResult::Registered(manifest)) => {
            println!("\n✅ Registered: {:?}", manifest.claim_generator);
            if let Some(sig) = &manifest.signature_info {
                println!("   {}", sig.summary());
            }
        }
        Resolution::Settled(ProvenanceResult::WatermarkOnly(info)) => {
            println!("\n✅ Watermark only: {}", info.secret);
        }
        Resolution::Settled(ProvenanceResult::None) => {
            println!("\n❌ No provenance found");
        }
        Resolution::Superseded => {
            println!("\n❌ Superseded by a newer resolution");
        }
    }

    println!("\n=== Live Scan Demo ===\n");

    let scanner = FrameCaptureScanner::with_config(
        MockWatermarkProbe::hit(watermark),
        ScannerConfig {
            tick_period: Duration::from_millis(200),
            crop_ratio: 0.9,
        },
    );
    let video = Arc::new(MockVideoSource::new(vec![MockVideoSource::solid_frame(
        640,
        480,
        [40, 80, 120],
    )]));

    let (tx, rx) = tokio::sync::oneshot::channel();
    scanner
        .start(Arc::clone(&video) as Arc<dyn VideoSource>, move |frame| {
            let _ = tx.send(frame);
        })
        .await
        .expect("mock camera acquires");

    match rx.await {
        Ok(frame) => {
            println!(
                "\n✅ Watermark detected in a {}x{} crop captured at {}",
                frame.square_size, frame.square_size, frame.timestamp
            );
        }
        Err(_) => println!("\n❌ Scan ended without a detection"),
    }

    println!("   Camera tracks live: {}", video.track_count());
}
