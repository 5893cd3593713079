//! `oolongc`, the Oolong model compiler.
//!
//! Usage:
//!   oolongc -i <schema-file-or-dir> -o <build-dir> [--target models|sql|all]
//!
//! Links the schema documents, then generates model modules, modifier
//! stubs and SQL migrations into the build directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use oolong_codegen::{
    write_files, GeneratedCode, Generator, ModelGenerator, SqlSchemaGenerator,
};
use oolong_linker::Linker;

/// Oolong model compiler.
#[derive(Parser, Debug)]
#[command(name = "oolongc", about = "Generate model code from Oolong schema documents")]
struct Cli {
    /// Schema document file, or a directory of *.json documents.
    #[arg(short = 'i', long = "input", required = true)]
    input: PathBuf,

    /// Build output directory.
    #[arg(short = 'o', long = "output", required = true)]
    output: PathBuf,

    /// What to generate: models, sql, or all.
    #[arg(short = 't', long = "target", default_value = "all")]
    target: String,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let generators: Vec<Box<dyn Generator>> = match cli.target.as_str() {
        "models" => vec![Box::new(ModelGenerator::new())],
        "sql" => vec![Box::new(SqlSchemaGenerator::new())],
        "all" => vec![
            Box::new(ModelGenerator::new()),
            Box::new(SqlSchemaGenerator::new()),
        ],
        other => anyhow::bail!("unsupported target: {}", other),
    };

    let mut linker = Linker::new();
    linker
        .load_path(&cli.input)
        .with_context(|| format!("failed to load schemas from {}", cli.input.display()))?;
    let schemas = linker.link()?;
    info!(schemas = schemas.len(), "schemas linked");

    for (name, schema) in &schemas {
        for generator in &generators {
            let code: GeneratedCode = generator
                .generate(schema)
                .with_context(|| format!("generating {} for schema '{}'", generator.target(), name))?;
            let written = write_files(&code, &cli.output)
                .with_context(|| format!("writing build output to {}", cli.output.display()))?;
            for path in &written {
                info!(target = generator.target(), file = %path.display(), "written");
            }
            let skipped = code.files.len() - written.len();
            if skipped > 0 {
                info!(target = generator.target(), skipped, "existing modifier stubs kept");
            }
        }
    }

    Ok(())
}
