//! nCoV QC Summary Tool
//!
//! Summarize variant, consensus and coverage QC for one sample

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use ncov_qc_tools::reporting::{export_json, write_tsv};
use ncov_qc_tools::{Instrument, QcConfig, QcSummarizer, SampleInputs};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("ncov-qc-summary")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Per-sample QC summary for viral sequencing runs")
        .arg(
            Arg::new("instrument")
                .short('n')
                .long("instrument")
                .value_name("PLATFORM")
                .help("Sequencing platform that produced the variant file")
                .value_parser(["illumina", "ont", "nanopore"])
                .default_value("illumina"),
        )
        .arg(
            Arg::new("variants")
                .short('v')
                .long("variants")
                .value_name("FILE")
                .help("<sample>.variants.tsv (illumina) or <sample>.pass.vcf (ont)")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("coverage")
                .short('e')
                .long("coverage")
                .value_name("BED")
                .help("<sample>.per_base_coverage.bed file")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("qc")
                .short('c')
                .long("qc")
                .value_name("CSV")
                .help("<sample>.qc.csv file; derived from the consensus when omitted")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("consensus")
                .short('f')
                .long("fasta")
                .value_name("FASTA")
                .help("Consensus FASTA file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("reference")
                .short('r')
                .long("reference")
                .value_name("FASTA")
                .help("Reference genome FASTA file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("meta")
                .short('m')
                .long("meta")
                .value_name("TSV")
                .help("Metadata table with Ct values and collection dates")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("indel")
                .short('i')
                .long("indel")
                .help("Count indels [default: off]")
                .action(ArgAction::SetTrue)
                .conflicts_with("no_indel"),
        )
        .arg(
            Arg::new("no_indel")
                .long("no-indel")
                .help("Do not count indels, overriding the config file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("mask_start")
                .long("mask-start")
                .value_name("BASES")
                .help("Bases to mask at the start of the genome [default: 100]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("mask_end")
                .long("mask-end")
                .value_name("BASES")
                .help("Bases to mask at the end of the genome [default: 50]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("JSON")
                .help("JSON configuration file; command line options take precedence")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("TSV")
                .help("Output summary table, '-' for stdout")
                .default_value("-"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .value_name("JSON")
                .help("Also write the summary as JSON")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn build_config(matches: &ArgMatches) -> Result<QcConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => QcConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => QcConfig::default(),
    };

    if let Some(&mask_start) = matches.get_one::<u64>("mask_start") {
        config.mask.mask_start = mask_start;
    }
    if let Some(&mask_end) = matches.get_one::<u64>("mask_end") {
        config.mask.mask_end = mask_end;
    }
    if matches.get_flag("indel") {
        config.count_indels = true;
    }
    if matches.get_flag("no_indel") {
        config.count_indels = false;
    }
    Ok(config)
}

fn required_path(matches: &ArgMatches, id: &str) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(id)
        .cloned()
        .with_context(|| format!("--{id} is required"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();

    let instrument: Instrument = matches
        .get_one::<String>("instrument")
        .map(String::as_str)
        .unwrap_or("illumina")
        .parse()?;
    let config = build_config(&matches)?;

    let inputs = SampleInputs {
        variants: required_path(&matches, "variants")?,
        coverage: required_path(&matches, "coverage")?,
        qc: matches.get_one::<PathBuf>("qc").cloned(),
        consensus: matches.get_one::<PathBuf>("consensus").cloned(),
        reference: matches.get_one::<PathBuf>("reference").cloned(),
        metadata: matches.get_one::<PathBuf>("meta").cloned(),
    };

    log::info!("Variants: {}", inputs.variants.display());
    log::info!("Coverage: {}", inputs.coverage.display());
    log::info!(
        "Mask: {} / {} bases, count indels: {}",
        config.mask.mask_start,
        config.mask.mask_end,
        config.count_indels
    );

    let summarizer = QcSummarizer::new(config);
    let summary = summarizer
        .summarize_sample(instrument, &inputs)
        .context("Failed to summarize sample")?;
    let summaries = [summary];

    let output = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("-");
    if output == "-" {
        write_tsv(io::stdout().lock(), &summaries)?;
    } else {
        let file = File::create(output).with_context(|| format!("Failed to create {output}"))?;
        write_tsv(BufWriter::new(file), &summaries)?;
        log::info!("Summary saved to: {output}");
    }

    if let Some(json_path) = matches.get_one::<PathBuf>("json") {
        export_json(&summaries, json_path)?;
        log::info!("JSON summary saved to: {}", json_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let matches = cli()
            .try_get_matches_from([
                "ncov-qc-summary",
                "-v",
                "a.tsv",
                "-e",
                "a.bed",
                "--mask-start",
                "20",
                "--no-indel",
            ])
            .unwrap();
        let config = build_config(&matches).unwrap();
        assert_eq!(config.mask.mask_start, 20);
        assert_eq!(config.mask.mask_end, 50);
        assert!(!config.count_indels);
    }

    #[test]
    fn test_indels_off_unless_requested() {
        let matches = cli()
            .try_get_matches_from(["ncov-qc-summary", "-v", "a.tsv", "-e", "a.bed"])
            .unwrap();
        assert!(!build_config(&matches).unwrap().count_indels);

        let matches = cli()
            .try_get_matches_from(["ncov-qc-summary", "-v", "a.tsv", "-e", "a.bed", "-i"])
            .unwrap();
        assert!(build_config(&matches).unwrap().count_indels);
    }

    #[test]
    fn test_no_indel_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"count_indels": true}"#).unwrap();
        let config_path = file.path().to_str().unwrap();

        let matches = cli()
            .try_get_matches_from([
                "ncov-qc-summary",
                "-v",
                "a.tsv",
                "-e",
                "a.bed",
                "--config",
                config_path,
                "--no-indel",
            ])
            .unwrap();
        assert!(!build_config(&matches).unwrap().count_indels);
    }

    #[test]
    fn test_indel_flags_conflict() {
        let result = cli().try_get_matches_from([
            "ncov-qc-summary",
            "-v",
            "a.tsv",
            "-e",
            "a.bed",
            "--indel",
            "--no-indel",
        ]);
        assert!(result.is_err());
    }
}
