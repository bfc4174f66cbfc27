//! segeval - avaliação de segmentações em notação de colchetes
//!
//! # Uso
//!
//! ```bash
//! # Avalia uma predição já limpa contra o ground truth
//! segeval eval --gold anotado.txt --pred predito.txt
//!
//! # Avalia a saída bruta do modelo, resolvendo os placeholders (XX
//! segeval eval --gold anotado.txt --pred bruto.txt --reference entrada_graminput.txt
//!
//! # Vários documentos em paralelo (arquivos com o mesmo nome nos dois diretórios)
//! segeval batch --gold-dir anotados/ --pred-dir preditos/
//!
//! # Preparação de dados
//! segeval encode texto.txt            # -> texto_graminput.txt
//! segeval split anotado.txt           # uma sentença por linha
//! segeval normalize --reference entrada.txt --pred bruto.txt
//! segeval tei --pred predito.txt -o predito.xml
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use segeval_core::corpus::{demo_document, demo_documents};
use segeval_core::encoder::encode_text;
use segeval_core::normalize::{normalize_prediction, resolve_placeholders};
use segeval_core::sentences::split_sentences;
use segeval_core::tei::TeiDocument;
use segeval_core::tokenizer::read_prediction_stream;
use segeval_core::{EvalJob, EvalPipeline, Report};

/// Avaliação de segmentações em notação de colchetes
#[derive(Parser)]
#[command(name = "segeval", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compara uma predição com o ground truth e imprime o relatório
    Eval {
        /// Arquivo com a anotação manual
        #[arg(short, long)]
        gold: PathBuf,
        /// Arquivo com a predição (uma árvore por linha)
        #[arg(short, long)]
        pred: PathBuf,
        /// Entrada da gramática; ativa a resolução dos placeholders `(XX`
        #[arg(short, long)]
        reference: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Avalia todos os pares de arquivos com o mesmo nome em dois diretórios
    Batch {
        #[arg(long)]
        gold_dir: PathBuf,
        #[arg(long)]
        pred_dir: PathBuf,
        /// Diretório com as entradas da gramática (mesmos nomes)
        #[arg(long)]
        reference_dir: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Limpa a saída bruta do modelo (eco, uma árvore por linha, placeholders)
    Normalize {
        #[arg(short, long)]
        reference: PathBuf,
        #[arg(short, long)]
        pred: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Gera a entrada da gramática a partir de texto bruto
    Encode {
        input: PathBuf,
        /// Padrão: `<nome>_graminput.txt` ao lado da entrada
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Separa um fluxo de colchetes em uma sentença por linha
    Split {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Exporta uma predição como TEI-XML
    Tei {
        #[arg(short, long)]
        pred: PathBuf,
        /// Se informado, a predição é normalizada antes
        #[arg(short, long)]
        reference: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Avalia os documentos de demonstração embutidos
    Demo {
        /// Nome de um documento (padrão: todos)
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("segeval=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Eval {
            gold,
            pred,
            reference,
            format,
        } => {
            let mut pipeline = EvalPipeline::new().with_source(pred.display().to_string());
            if let Some(path) = &reference {
                pipeline = pipeline.with_reference(read(path)?);
            }
            let report = pipeline
                .evaluate(&read(&gold)?, &read(&pred)?)
                .map_err(|e| anyhow!("{}: {}", pred.display(), e))?;
            info!(spans = report.ground_truth.spans, "avaliação concluída");
            print_reports(&[report], format)
        }
        Commands::Batch {
            gold_dir,
            pred_dir,
            reference_dir,
            format,
        } => {
            let jobs = collect_jobs(&gold_dir, &pred_dir, reference_dir.as_deref())?;
            if jobs.is_empty() {
                bail!("nenhum par de arquivos encontrado em {}", gold_dir.display());
            }
            info!(documents = jobs.len(), "avaliando lote");

            let mut reports = Vec::with_capacity(jobs.len());
            let mut failures = 0;
            for outcome in EvalPipeline::evaluate_batch(&jobs) {
                match outcome.result {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        failures += 1;
                        eprintln!("error: {}: {}", outcome.name, e);
                    }
                }
            }
            print_reports(&reports, format)?;
            if failures > 0 {
                bail!("{} de {} documentos falharam", failures, jobs.len());
            }
            Ok(())
        }
        Commands::Normalize {
            reference,
            pred,
            output,
        } => {
            let cleaned = normalize_prediction(&read(&reference)?, &read(&pred)?)
                .with_context(|| format!("normalizando {}", pred.display()))?;
            write_output(output.as_deref(), &format!("{}\n", cleaned))
        }
        Commands::Encode { input, output } => {
            let encoded = encode_text(&read(&input)?);
            let target = output.unwrap_or_else(|| graminput_path(&input));
            write_output(Some(&target), &format!("{}\n", encoded))
        }
        Commands::Split { input, output } => {
            let sentences = split_sentences(&read(&input)?);
            debug!(sentences = sentences.len(), "sentenças separadas");
            let mut out = sentences.join("\n");
            out.push('\n');
            write_output(output.as_deref(), &out)
        }
        Commands::Tei {
            pred,
            reference,
            output,
        } => {
            let text = read(&pred)?;
            let tokens = match &reference {
                Some(path) => resolve_placeholders(&read(path)?, &text)
                    .with_context(|| format!("normalizando {}", pred.display()))?,
                None => read_prediction_stream(&text),
            };
            let document = TeiDocument::from_tokens(&tokens)
                .with_context(|| format!("{} não é uma árvore válida", pred.display()))?
                .with_timestamp(chrono::Local::now().format("%d.%m.%Y").to_string());
            write_output(output.as_deref(), &document.to_xml())
        }
        Commands::Demo { name } => {
            let documents = match name {
                Some(name) => {
                    vec![demo_document(&name).ok_or_else(|| anyhow!("documento desconhecido: {}", name))?]
                }
                None => demo_documents(),
            };
            for doc in documents {
                let report = EvalPipeline::new()
                    .with_reference(doc.reference())
                    .with_source(doc.name)
                    .evaluate(doc.ground_truth, doc.prediction)
                    .map_err(|e| anyhow!("{}: {}", doc.name, e))?;
                println!("{}", report);
            }
            Ok(())
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("falha ao ler {}", path.display()))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("falha ao escrever {}", path.display()))?;
            info!(path = %path.display(), "arquivo gravado");
            Ok(())
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// `texto.txt` → `texto_graminput.txt`
fn graminput_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    input.with_file_name(format!("{}_graminput.txt", stem))
}

fn collect_jobs(gold_dir: &Path, pred_dir: &Path, reference_dir: Option<&Path>) -> Result<Vec<EvalJob>> {
    let mut gold_files: Vec<PathBuf> = fs::read_dir(gold_dir)
        .with_context(|| format!("falha ao listar {}", gold_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    gold_files.sort();

    let mut jobs = Vec::new();
    for gold in gold_files {
        let Some(file_name) = gold.file_name() else {
            continue;
        };
        let pred = pred_dir.join(file_name);
        if !pred.is_file() {
            warn!(file = %gold.display(), "sem predição correspondente, ignorado");
            continue;
        }
        let reference = match reference_dir {
            Some(dir) => Some(read(&dir.join(file_name))?),
            None => None,
        };
        jobs.push(EvalJob {
            name: file_name.to_string_lossy().into_owned(),
            ground_truth: read(&gold)?,
            prediction: read(&pred)?,
            reference,
        });
    }
    Ok(jobs)
}

fn print_reports(reports: &[Report], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for report in reports {
                println!("{}", report);
            }
        }
        OutputFormat::Json => {
            let json = if reports.len() == 1 {
                serde_json::to_string_pretty(&reports[0])?
            } else {
                serde_json::to_string_pretty(reports)?
            };
            println!("{}", json);
        }
    }
    Ok(())
}
