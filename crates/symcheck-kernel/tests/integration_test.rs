//! Integration test: boot kernel -> analyze symptoms via the live Groq API.
//!
//! Run with: GROQ_API_KEY=gsk_... cargo test -p symcheck-kernel --test integration_test -- --nocapture

use symcheck_kernel::SymcheckKernel;
use symcheck_types::config::SymcheckConfig;

fn test_config() -> (tempfile::TempDir, SymcheckConfig) {
    let tmp = tempfile::tempdir().unwrap();
    let config = SymcheckConfig {
        home_dir: tmp.path().to_path_buf(),
        ..SymcheckConfig::default()
    };
    (tmp, config)
}

#[tokio::test]
async fn test_full_pipeline_with_groq() {
    if std::env::var("GROQ_API_KEY").is_err() {
        eprintln!("GROQ_API_KEY not set, skipping integration test");
        return;
    }

    let (_tmp, config) = test_config();
    let kernel = SymcheckKernel::boot_with_config(config).expect("Kernel should boot");

    let recorded = kernel
        .analyze_and_record("Mild fever and a dry cough for two days.")
        .await
        .expect("Analysis should be recorded");

    println!("\n=== ANALYSIS ({}) ===", recorded.outcome.model_used);
    println!("{}", recorded.outcome.text);

    assert!(!recorded.outcome.text.is_empty(), "Result should not be empty");
    assert_eq!(recorded.record.symptoms, "Mild fever and a dry cough for two days.");

    let history = kernel.list_history(None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].model_used, recorded.outcome.model_used);

    kernel.shutdown();
}
