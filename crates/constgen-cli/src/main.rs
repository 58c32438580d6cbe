use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use constgen_codegen::{Generator, GeneratorConfig, TargetLanguage};

#[derive(Parser, Debug)]
#[command(
    name = "constgen",
    about = "Generate PKCS#11 constant definitions from NSS's pkcs11t.h and pkcs11n.h",
    version
)]
struct Cli {
    /// Path to pkcs11t.h header
    #[arg(long, value_name = "PATH")]
    pkcs11t: PathBuf,

    /// Path to pkcs11n.h header
    #[arg(long, value_name = "PATH")]
    pkcs11n: PathBuf,

    /// Path to write the generated file to
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: PathBuf,

    /// The headers are the system-installed ones; check every value with cc
    #[arg(short = 's', long = "system")]
    system: bool,

    /// Write verbose comments in the output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Output language
    #[arg(long, value_enum)]
    target: Option<Target>,

    /// Java package of the generated interface
    #[arg(long, value_name = "NAME")]
    package: Option<String>,

    /// Name of the generated Java interface
    #[arg(long, value_name = "NAME")]
    type_name: Option<String>,

    /// Skip compiling the generated output
    #[arg(long)]
    no_compile_check: bool,

    /// Resolve constants in parallel
    #[arg(long)]
    parallel: bool,

    /// JSON file with a generator configuration; flags override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    Java,
    Rust,
    Json,
}

impl From<Target> for TargetLanguage {
    fn from(target: Target) -> Self {
        match target {
            Target::Java => TargetLanguage::Java,
            Target::Rust => TargetLanguage::Rust,
            Target::Json => TargetLanguage::Json,
        }
    }
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(target) = cli.target {
        config.target = target.into();
    }
    if let Some(package) = &cli.package {
        config.java_package = package.clone();
    }
    if let Some(type_name) = &cli.type_name {
        config.type_name = type_name.clone();
    }
    config.verbose |= cli.verbose;
    config.verify_system |= cli.system;
    config.resolver.parallel |= cli.parallel;
    if cli.no_compile_check {
        config.compile_check = false;
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    debug!("Configuration: {:?}", config);

    let generator = Generator::new(config);
    let output = generator
        .generate_from_paths(&[&cli.pkcs11t, &cli.pkcs11n])
        .context("failed to generate constant definitions")?;

    fs::write(&cli.output, &output.text)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!(
        "Wrote {} constants to {}",
        output.stats.constants,
        cli.output.display()
    );

    println!("Success generating constant definitions");
    Ok(())
}
