mod cli;

use clipvault::{
    config::{self, keys, ConverterConfig, Settings},
    pipeline::Converter,
};

use anyhow::Result;
use clap::Parser;
use clipvault_av::{ProcessRunner, Prober};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipvault=trace,clipvault_av=trace".to_string()
        } else {
            "clipvault=debug,clipvault_av=debug".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Convert { dry_run, copy_only } => {
            let mut settings = load(&cli)?;
            if dry_run {
                settings.set(keys::DRY_RUN, "true");
            }
            if copy_only {
                settings.set(keys::COPY_ONLY, "true");
            }
            convert(&settings)
        }
        Commands::Probe { ref file } => probe_file(&cli, file),
        Commands::CheckTools => check_tools(&cli),
        Commands::Validate => validate_config(&cli),
        Commands::Version => {
            println!("clipvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load(cli: &Cli) -> Result<Settings> {
    Ok(config::load_settings(
        cli.config.as_deref(),
        cli.profile.as_deref(),
    )?)
}

fn convert(settings: &Settings) -> Result<()> {
    let converter = Converter::from_settings(settings)?;
    converter.convert()?;
    Ok(())
}

fn probe_file(cli: &Cli, file: &std::path::Path) -> Result<()> {
    let settings = load(cli)?;
    let tools = clipvault_av::Tools::from_root(settings.required(keys::FFMPEG_ROOT)?);

    let duration = Prober::new(tools.ffprobe(), ProcessRunner::new()).probe(file)?;

    println!("File: {}", file.display());
    println!("Duration: {}", duration);
    Ok(())
}

fn check_tools(cli: &Cli) -> Result<()> {
    let settings = load(cli)?;
    let tools = clipvault_av::Tools::from_root(settings.required(keys::FFMPEG_ROOT)?);

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in tools.check() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {} - {}", status, tool.name, tool.path.display());

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref hint) = tool.path_hint {
            print!(" [found on PATH at {}]", hint.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("Some tools are missing. Check {} in your config.", keys::FFMPEG_ROOT)
    }
}

fn validate_config(cli: &Cli) -> Result<()> {
    let settings = load(cli)?;
    let config = ConverterConfig::from_settings(&settings)?;
    config.tools.require()?;

    println!("✓ Configuration is valid");
    if !settings.profile().is_empty() {
        println!("  Profile: {}", settings.profile().trim_end_matches('.'));
    }
    println!("  Input directory: {}", config.input_directory.display());
    println!("  Output directory: {}", config.output_directory.display());
    println!("  Project delimiter: [{}]", config.project_delimiter);
    println!("  ffmpeg: {}", config.tools.ffmpeg().display());
    println!("  ffprobe: {}", config.tools.ffprobe().display());
    println!("  Dry run: {}", config.dry_run);
    println!("  Copy only: {}", config.copy_only);
    println!("  Delete input: {}", config.delete_input_file);
    match &config.fading {
        Some(fading) => {
            println!("  Fading: {}s", fading.duration);
            if let Some(ref intro) = fading.intro {
                println!("  Intro: {}", intro.display());
            }
        }
        None => println!("  Fading: off"),
    }
    println!("  Upload: {}", config.upload.is_some());

    Ok(())
}
