use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::{debug, info, trace, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

mod diff;
mod matcher;
mod report;
mod scoring;

use diff::{generate_diff, DiffSummary};
use report::GroupWriters;

#[derive(Parser, Debug)]
#[command(
    name = "compare-editdist",
    version,
    about = "Compare hypothesis lines against references and rank the best/worst matches"
)]
struct Cli {
    /// Hypothesis file, one sentence per line
    #[arg(long)]
    hyp: PathBuf,

    /// Reference file, aligned line by line with --hyp
    #[arg(long = "ref")]
    reference: PathBuf,

    /// Optional source file; empty source lines are written when absent
    #[arg(long)]
    src: Option<PathBuf>,

    /// HTML report destination (not written if omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Lowercase hypothesis and reference before comparing
    #[arg(long = "normalize_case", action = ArgAction::SetTrue)]
    normalize_case: bool,

    /// Token granularity
    #[arg(long, value_enum, default_value = "word")]
    what: Granularity,

    /// Stylesheet referenced by the HTML report
    #[arg(long, default_value = "diff.css")]
    css: String,

    /// Hypotheses of the closest matches, one per line
    #[arg(long = "best_trads_pred")]
    best_trads_pred: PathBuf,

    /// Source lines of the closest matches
    #[arg(long = "best_trads_src")]
    best_trads_src: PathBuf,

    /// References of the closest matches
    #[arg(long = "best_trads_ref")]
    best_trads_ref: PathBuf,

    /// "index,distance" of the closest matches (1-based index)
    #[arg(long = "best_trads_idx")]
    best_trads_idx: PathBuf,

    /// Hypotheses of the most distant matches, one per line
    #[arg(long = "worst_trads_pred")]
    worst_trads_pred: PathBuf,

    /// Source lines of the most distant matches
    #[arg(long = "worst_trads_src")]
    worst_trads_src: PathBuf,

    /// References of the most distant matches
    #[arg(long = "worst_trads_ref")]
    worst_trads_ref: PathBuf,

    /// "index,distance" of the most distant matches (1-based index)
    #[arg(long = "worst_trads_idx")]
    worst_trads_idx: PathBuf,

    /// Number of lines kept in each of the best and worst groups
    #[arg(long = "how_many")]
    how_many: usize,

    /// Enable debug logs
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long = "log_file")]
    log_file: Option<PathBuf>,
}

/// Token granularity used when splitting a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Granularity {
    Word,
    Char,
}

/// Raw lines of the aligned input streams, fully loaded.
#[derive(Debug, Default)]
pub struct Corpus {
    pub hyp: Vec<String>,
    pub reference: Vec<String>,
    /// `None` when no source file was given: every line then has an empty source.
    pub src: Option<Vec<String>>,
}

/// Token sequences of one aligned line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine {
    pub hyp: Vec<String>,
    pub reference: Vec<String>,
    pub src: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    run(cli)
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.debug { "debug" } else { "info" };
    let Some(log_path) = &cli.log_file else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .init();
        return;
    };

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = fs::create_dir_all(parent);
    }
    match fs::File::create(log_path) {
        Ok(file) => {
            let cfg = ConfigBuilder::new()
                .set_time_format_rfc3339()
                .set_target_level(LevelFilter::Off)
                .build();
            if let Err(e) = WriteLogger::init(LevelFilter::Debug, cfg, file) {
                eprintln!("[warn] file logger init failed: {e}");
            }
        }
        Err(e) => {
            eprintln!("[warn] cannot create log file {:?}: {e}", log_path);
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(default_level),
            )
            .init();
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Outputs are truncated up front, before any input is read.
    let mut html_out = cli.output.as_deref().map(report::create_output).transpose()?;
    let mut best = GroupWriters::create(
        &cli.best_trads_pred,
        &cli.best_trads_src,
        &cli.best_trads_ref,
        &cli.best_trads_idx,
    )?;
    let mut worst = GroupWriters::create(
        &cli.worst_trads_pred,
        &cli.worst_trads_src,
        &cli.worst_trads_ref,
        &cli.worst_trads_idx,
    )?;

    let corpus = load_corpus(&cli.hyp, &cli.reference, cli.src.as_deref(), cli.normalize_case)?;

    let pairs = corpus.pairs(cli.what);
    let mut summary = DiffSummary::default();
    for (h, r) in &pairs {
        for op in generate_diff(h, r) {
            trace!("{op}");
            summary.add(&op);
        }
    }
    debug!(
        "diff ops: {} equal, {} replace, {} delete, {} insert",
        summary.equal, summary.replace, summary.delete, summary.insert
    );

    let average = scoring::average_ratio(&pairs)?;
    info!(
        "average edit distance (Ratcliff-Obershelp) over {} lines: {}",
        pairs.len(),
        report::format_significant(average, 3)
    );

    match (&cli.output, html_out.as_mut()) {
        (Some(path), Some(writer)) => report::write_report(writer, &cli.css, average)
            .with_context(|| format!("Writing HTML report {:?}", path))?,
        _ => report::write_report(&mut io::sink(), &cli.css, average)
            .context("Rendering HTML report")?,
    }

    let scored = scoring::score_lines(&corpus.triples(cli.what))?;
    let (best_lines, worst_lines) = scoring::best_and_worst(&scored, cli.how_many);
    best.write_group(best_lines).context("Writing best translations")?;
    worst.write_group(worst_lines).context("Writing worst translations")?;
    info!(
        "wrote {} best and {} worst of {} lines",
        best_lines.len(),
        worst_lines.len(),
        scored.len()
    );
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading input file {:?}", path))?;
    Ok(content.lines().map(str::to_string).collect())
}

pub fn load_corpus(
    hyp: &Path,
    reference: &Path,
    src: Option<&Path>,
    normalize_case: bool,
) -> Result<Corpus> {
    let mut corpus = Corpus {
        hyp: read_lines(hyp)?,
        reference: read_lines(reference)?,
        src: src.map(read_lines).transpose()?,
    };
    debug!(
        "loaded {} hyp lines, {} ref lines, {} src lines",
        corpus.hyp.len(),
        corpus.reference.len(),
        corpus.src.as_ref().map_or(0, Vec::len)
    );

    if normalize_case {
        lowercase_all(&mut corpus.hyp);
        lowercase_all(&mut corpus.reference);
    }
    Ok(corpus)
}

fn lowercase_all(lines: &mut [String]) {
    for line in lines.iter_mut() {
        *line = line.to_lowercase();
    }
}

/// Unicode whitespace plus the ASCII information separators (FS, GS, RS, US).
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

pub fn tokenize(line: &str, what: Granularity) -> Vec<String> {
    let line = line.trim_matches(is_separator);
    match what {
        Granularity::Word => line
            .split(is_separator)
            .filter(|tok| !tok.is_empty())
            .map(str::to_string)
            .collect(),
        Granularity::Char => line.chars().map(String::from).collect(),
    }
}

impl Corpus {
    /// Hypothesis/reference pairs used for the aggregate ratio, truncated to
    /// the shorter of the two streams.
    pub fn pairs(&self, what: Granularity) -> Vec<(Vec<String>, Vec<String>)> {
        if self.hyp.len() != self.reference.len() {
            warn!(
                "hyp has {} lines but ref has {}; extra lines are ignored",
                self.hyp.len(),
                self.reference.len()
            );
        }
        self.hyp
            .iter()
            .zip(&self.reference)
            .map(|(h, r)| (tokenize(h, what), tokenize(r, what)))
            .collect()
    }

    /// Aligned triples used for ranking. An absent source stands in as an
    /// empty line for every pair; a present one also bounds the line count.
    pub fn triples(&self, what: Granularity) -> Vec<TokenizedLine> {
        let pairs = self.hyp.iter().zip(&self.reference);
        match &self.src {
            Some(src) => {
                let paired = self.hyp.len().min(self.reference.len());
                if src.len() != paired {
                    warn!(
                        "src has {} lines but hyp/ref have {}; ranking uses the shortest",
                        src.len(),
                        paired
                    );
                }
                pairs
                    .zip(src)
                    .map(|((h, r), s)| TokenizedLine {
                        hyp: tokenize(h, what),
                        reference: tokenize(r, what),
                        src: tokenize(s, what),
                    })
                    .collect()
            }
            None => pairs
                .map(|(h, r)| TokenizedLine {
                    hyp: tokenize(h, what),
                    reference: tokenize(r, what),
                    src: Vec::new(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn word_mode_splits_on_whitespace_runs() {
        assert_eq!(tokenize("  a  b\tc \r", Granularity::Word), lines(&["a", "b", "c"]));
        assert!(tokenize("   ", Granularity::Word).is_empty());
    }

    #[test]
    fn information_separators_split_and_trim() {
        assert_eq!(tokenize("a\x1fb", Granularity::Word), lines(&["a", "b"]));
        assert_eq!(
            tokenize("\x1c a \x1d\x1e b\x1f", Granularity::Word),
            lines(&["a", "b"])
        );
        assert_eq!(tokenize("\x1ea b\x1c", Granularity::Char), lines(&["a", " ", "b"]));
    }

    #[test]
    fn char_mode_keeps_inner_spaces() {
        assert_eq!(tokenize(" é b\n", Granularity::Char), lines(&["é", " ", "b"]));
    }

    #[test]
    fn missing_source_yields_empty_tokens() {
        let corpus = Corpus {
            hyp: lines(&["a b", "c d"]),
            reference: lines(&["a b", "x d"]),
            src: None,
        };
        let triples = corpus.triples(Granularity::Word);
        assert_eq!(triples.len(), 2);
        assert!(triples.iter().all(|t| t.src.is_empty()));
    }

    #[test]
    fn streams_truncate_to_shortest() {
        let corpus = Corpus {
            hyp: lines(&["a", "b", "c"]),
            reference: lines(&["a", "b"]),
            src: Some(lines(&["s"])),
        };
        assert_eq!(corpus.pairs(Granularity::Word).len(), 2);
        assert_eq!(corpus.triples(Granularity::Word).len(), 1);
    }

    #[test]
    fn normalization_lowercases_hyp_and_ref_only() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let hyp = dir.path().join("hyp.txt");
        let reference = dir.path().join("ref.txt");
        let src = dir.path().join("src.txt");
        fs::write(&hyp, "Hello World\n")?;
        fs::write(&reference, "HELLO world\n")?;
        fs::write(&src, "Bonjour\n")?;

        let corpus = load_corpus(&hyp, &reference, Some(&src), true)?;
        assert_eq!(corpus.hyp, lines(&["hello world"]));
        assert_eq!(corpus.reference, lines(&["hello world"]));
        assert_eq!(corpus.src, Some(lines(&["Bonjour"])));
        Ok(())
    }

    #[test]
    fn unreadable_input_names_the_path() {
        let err = load_corpus(Path::new("/nonexistent/hyp"), Path::new("/nonexistent/ref"), None, false)
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/hyp"));
    }
}
