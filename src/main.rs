mod cli;
mod config;
mod pipelines;
mod utils;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};

use anyhow::Result;
use env_logger::Builder;
use log::{LevelFilter, error, info};

use crate::cli::parse;
use crate::config::defs::{PipelineError, RunConfig, ToolSettings};
use crate::pipelines::workflow::{VariantCallingWorkflow, run_timed};
use crate::pipelines::{bam_prep, known_sites, variants};
use crate::utils::file::replace_extension;
use crate::utils::install;
use crate::utils::script::generate_and_run_script;

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n RNA-Seq variant calling\n-------------\n");

    let dir = env::current_dir()?;
    info!("The current directory is {:?}", dir);

    let work_dir = setup_work_dir(&args, &dir)?;
    info!("The working directory is {:?}", work_dir);

    let tools = ToolSettings {
        shell_path: PathBuf::from(&args.shell),
        java_heap_gb: args.java_heap_gb,
        chromosome_mappings_dir: work_dir.join(config::defs::CHROMOSOME_MAPPINGS_DIR),
        ..ToolSettings::default()
    };

    let module = args.module.clone();
    let run_config = RunConfig {
        cwd: dir,
        work_dir,
        args,
        tools,
    };

    if let Err(e) = match module.as_str() {
        "call-variants" => call_variants_run(&run_config).await,
        "prepare-bam" => prepare_bam_run(&run_config).await,
        "subset-bam" => subset_bam_run(&run_config).await,
        "download-known-sites" => download_known_sites_run(&run_config).await,
        "install-deps" => install_deps_run(&run_config).await,
        "install-gatk" => install_gatk_run(&run_config).await,
        _ => Err(PipelineError::InvalidConfig(format!(
            "Invalid module: {}",
            module
        ))),
    } {
        error!(
            "Pipeline failed: {} at {} milliseconds.",
            e,
            run_start.elapsed().as_millis()
        );
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

async fn call_variants_run(config: &RunConfig) -> Result<(), PipelineError> {
    let workflow = VariantCallingWorkflow {
        bam: required_path(&config.args.bam, "--bam")?,
        genome_fasta: required_path(&config.args.genome_fasta, "--genome-fasta")?,
    };
    let summary = run_timed(&workflow, config, &config.work_dir).await?;
    info!(
        "Workflow {:?} finished in {:.3}s; summary at {}",
        summary.kind,
        summary.elapsed.as_secs_f64(),
        summary.results_path.display()
    );
    Ok(())
}

async fn prepare_bam_run(config: &RunConfig) -> Result<(), PipelineError> {
    let bam = required_path(&config.args.bam, "--bam")?;
    let genome_fasta = required_path(&config.args.genome_fasta, "--genome-fasta")?;
    let prepared = bam_prep::prepare_bam(config, &bam, &genome_fasta).await?;
    info!("Prepared BAM: {}", prepared.display());
    Ok(())
}

async fn subset_bam_run(config: &RunConfig) -> Result<(), PipelineError> {
    let bam = required_path(&config.args.bam, "--bam")?;
    let genome_fasta = required_path(&config.args.genome_fasta, "--genome-fasta")?;
    let region = config.args.genome_region.clone().ok_or_else(|| {
        PipelineError::InvalidConfig("--genome-region is required for this module".to_string())
    })?;
    let output = replace_extension(&bam, "subset.bam");
    let subset = variants::subset_bam(config, &bam, &genome_fasta, &region, &output).await?;
    info!("Subset BAM: {}", subset.display());
    Ok(())
}

async fn download_known_sites_run(config: &RunConfig) -> Result<(), PipelineError> {
    let genome_fasta = required_path(&config.args.genome_fasta, "--genome-fasta")?;
    let vcf = known_sites::download_known_sites(
        config,
        &config.work_dir,
        config.args.common_only,
        config.args.genome_build,
        &genome_fasta,
    )
    .await?;
    info!("Known sites: {}", vcf.display());
    Ok(())
}

async fn install_deps_run(config: &RunConfig) -> Result<(), PipelineError> {
    let script = config.script_path("install_dependencies.bash");
    let mut child =
        generate_and_run_script(&config.tools, &script, &install::dependency_setup_commands())
            .map_err(PipelineError::io)?;
    child.wait().await.map_err(PipelineError::io)?;
    Ok(())
}

async fn install_gatk_run(config: &RunConfig) -> Result<(), PipelineError> {
    let commands =
        install::gatk_install_commands(&config.work_dir).map_err(PipelineError::io)?;
    let script = config.script_path("install_gatk.bash");
    let mut child = generate_and_run_script(&config.tools, &script, &commands)
        .map_err(PipelineError::io)?;
    child.wait().await.map_err(PipelineError::io)?;
    Ok(())
}

fn required_path(arg: &Option<String>, flag: &str) -> Result<PathBuf, PipelineError> {
    arg.as_deref()
        .map(PathBuf::from)
        .ok_or_else(|| PipelineError::InvalidConfig(format!("{} is required for this module", flag)))
}

/// Resolves the working directory that holds `scripts/` and the pipeline
/// artifacts. `--out` is used when given (relative paths resolve against the
/// current directory); otherwise the current directory itself.
fn setup_work_dir(args: &cli::args::Arguments, cwd: &Path) -> Result<PathBuf> {
    let work_dir = match &args.out_dir {
        Some(out) => {
            let path = PathBuf::from(out);
            if path.is_absolute() { path } else { cwd.join(path) }
        }
        None => cwd.to_path_buf(),
    };
    fs::create_dir_all(&work_dir)?;
    Ok(work_dir)
}
