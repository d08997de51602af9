use anyhow::Result;
use std::path::{Path, PathBuf};
use threadetl::{init_tracing_once, PipelineConfig, ThreadEtl};

const INPUT_ROOT: &str = "./data/raw";
const OUTPUT_ROOT: &str = "./data/processed";
const CONFIG_PATH: &str = "./config/pipeline.json";
const JUDGMENTS_PATH: &str = "./data/judgments.json";

fn main() -> Result<()> {
    init_tracing_once();
    let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8);

    let config = if Path::new(CONFIG_PATH).exists() {
        PipelineConfig::load(Path::new(CONFIG_PATH))?
    } else {
        PipelineConfig::default()
    };
    let config = config.apply_env_overrides();

    let mut etl = ThreadEtl::new()
        .input(PathBuf::from(INPUT_ROOT))
        .out_dir(PathBuf::from(OUTPUT_ROOT))
        .config(config)
        .parallelism(hw)
        .progress(true)
        .jsonl_output(true);
    if Path::new(JUDGMENTS_PATH).exists() {
        etl = etl.judgments(JUDGMENTS_PATH);
    }

    let summary = etl.run()?;

    println!(
        "Kept {} of {} records ({} duplicates, {} invalid)",
        summary.posts_kept,
        summary.cleaning.total_input,
        summary.cleaning.duplicates_removed,
        summary.cleaning.invalid_removed
    );
    println!("Quality score {:.2} ({})", summary.quality_score, summary.grade);
    for f in &summary.files {
        println!("Wrote {}", f.display());
    }

    Ok(())
}
