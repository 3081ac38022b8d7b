use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use documind_core::llm::OpenAiCompatProvider;
use documind_core::{AppConfig, Document, RagEngine, RagError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    config.apply_env_secrets();
    documind_core::logging::init(&config.log_dir);

    let provider = Arc::new(
        OpenAiCompatProvider::new(&config).context("Failed to construct LLM provider")?,
    );
    let engine = RagEngine::new(config, provider.clone(), provider);

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if !paths.is_empty() {
        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            documents.push(Document::with_id(path.display().to_string(), text));
        }

        let report = engine.ingest(&documents).await?;
        println!(
            "Indexed {} chunks from {} file(s). You can now ask questions.",
            report.chunk_count,
            paths.len()
        );
    } else if !engine.has_index() {
        eprintln!("No index found. Pass one or more text files to build one first.");
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        print!("question> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() || question == "exit" || question == "quit" {
            break;
        }

        match engine.ask(question).await {
            Ok(answer) => println!("\n{}\n", answer.text),
            Err(RagError::IndexNotFound(_)) => {
                eprintln!("No index available yet; ingest documents first.");
            }
            Err(err) => eprintln!("error: {}", err),
        }
    }

    Ok(())
}
