use std::env;

use medlens::{
    config::Config,
    llm::build_provider,
    processing::{MedicalPipeline, PipelineApi, SummarySource},
};

fn live_config() -> Config {
    Config::from_lookup(|key| {
        env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| match key {
                "LLM_PROVIDER" => Some("local".into()),
                "LLM_ENDPOINT" => Some("http://127.0.0.1:11434".into()),
                "CHUNK_DELAY_MS" => Some("0".into()),
                _ => None,
            })
    })
    .expect("live configuration")
}

#[tokio::test]
#[ignore = "Requires a live local model service"]
async fn live_provider_is_ready_and_generates() {
    let config = live_config();
    let provider = build_provider(&config.provider);
    provider.check_ready().expect("provider should be ready");
    let reply = provider
        .generate("Reply with the single word: ready", 0.0)
        .await
        .expect("failed to request generation from provider");
    assert!(!reply.trim().is_empty(), "expected a non-empty reply");
}

#[tokio::test]
#[ignore = "Requires a live local model service"]
async fn live_summary_of_pasted_lab_values() {
    let pipeline = MedicalPipeline::new(&live_config());
    let result = pipeline
        .summarize(SummarySource::Text(
            "Complete Blood Count\nHemoglobin 9.1 g/dL (Low)\nFerritin 8 ng/mL (Low)".into(),
        ))
        .await;
    assert!(!result.is_error(), "summary failed: {}", result.text);
    assert!(!result.text.trim().is_empty());
}
