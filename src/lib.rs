#![forbid(unsafe_code)]
//! # Theme Analysis
//!
//! Document-level theme and concept extraction for plain-text and Markdown
//! documents.
//!
//! The pipeline normalizes a document into candidate terms, counts them,
//! samples bounded context snippets around the most frequent terms, builds a
//! symmetric co-occurrence graph over term proximity, ranks terms into
//! dominant and emerging themes, groups them into concept clusters, and flags
//! rarely mentioned terms as potential research gaps.
//!
//! The core stages are pure functions over the previous stage's output and
//! never touch the filesystem. File handling, batch processing, and export
//! live at the edges: [`analyze_path`], [`analyze_path_combined`], and the
//! [`report`] module.
//!
//! ## Example
//! ```
//! use theme_analysis::{AnalysisOptions, LanguageProfile, analyze_text};
//!
//! let profile = LanguageProfile::default();
//! let opts = AnalysisOptions::default();
//! let result = analyze_text("Freedom enables participation.", "doc.md", &profile, &opts);
//! assert_eq!(result.corpus_statistics.total_terms, 3);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

pub mod report;

pub use report::{ExportFormat, csv_safe_cell, render_report};

/// Marker line that terminates a metadata preamble. Everything up to and
/// including the first occurrence is skipped; if the marker is absent the
/// whole text is analyzed.
pub const METADATA_MARKER: &str = "## Extracted Text";

/// Number of top-frequency terms eligible for context sampling and
/// co-occurrence analysis.
pub const DEFAULT_SIGNIFICANT_TERMS: usize = 50;

/// Context snippet radius in characters.
pub const DEFAULT_CONTEXT_WINDOW: usize = 50;

/// Co-occurrence proximity radius in characters. Wider than the context
/// window; the two are independent parameters.
pub const DEFAULT_COOCCURRENCE_WINDOW: usize = 100;

/// Minimum term length in characters.
const MIN_TERM_LEN: usize = 3;
/// Pool of top-frequency terms that enter the importance ranking.
const RANKED_POOL: usize = 30;
/// Ranked themes considered as cluster centers.
const CLUSTER_POOL: usize = 20;
const MAX_DOMINANT: usize = 5;
const MAX_EMERGING: usize = 5;
const MAX_CLUSTERS: usize = 5;
const MAX_RELATED_TERMS: usize = 5;
const CLUSTER_RELATED_TERMS: usize = 3;
const MAX_CONTEXTS_PER_TERM: usize = 3;
const MAX_GAP_EXAMPLES: usize = 10;
const COMBINED_RANKING: usize = 20;
/// Frequency band for emerging themes, inclusive on both ends.
const EMERGING_MIN: u32 = 3;
const EMERGING_MAX: u32 = 10;

/// Common function words excluded from term extraction.
const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do", "does",
    "did", "will", "would", "should", "could", "may", "might", "must", "can", "this", "that",
    "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which", "who", "when",
    "where", "why", "how",
];

/// Accented letters accepted in addition to ASCII `a-z`.
const ACCENTED_LETTERS: &str = "áäčďéíľňóôŕšťúýž";

/// File extensions recognized as analyzable documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Errors raised at the analysis boundary.
///
/// Nothing here is fatal to a batch: per-document failures are collected into
/// the failed list and the remaining documents keep processing.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),
    #[error("no analyzable documents in {0}")]
    NoDocuments(PathBuf),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write table {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to serialize analysis result: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to read stopword list {path}: {source}")]
    Stopwords {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Alphabet and stopword configuration for term extraction.
///
/// The defaults cover English function words plus the accented letters found
/// in the corpora this tool was written for. Additional stopwords can be
/// merged in, typically from a one-word-per-line file via [`load_stopwords`].
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    stopwords: HashSet<String>,
    accented: HashSet<char>,
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            accented: ACCENTED_LETTERS.chars().collect(),
        }
    }
}

impl LanguageProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge additional stopwords into the profile.
    pub fn with_extra_stopwords(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.stopwords.extend(extra);
        self
    }

    /// Whether `c` belongs to the term alphabet.
    pub fn is_term_char(&self, c: char) -> bool {
        c.is_ascii_lowercase() || self.accented.contains(&c)
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }
}

/// Load additional stopwords from a plain text file, one word per line.
/// Blank lines and `#` comments are ignored.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>, AnalysisError> {
    let content = fs::read_to_string(path).map_err(|e| AnalysisError::Stopwords {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(content
        .lines()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect())
}

/// Tuning knobs for a single analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Number of top-frequency terms used for contexts and co-occurrence.
    pub significant_terms: usize,
    /// Context snippet radius in characters.
    pub context_window: usize,
    /// Co-occurrence proximity radius in characters.
    pub cooccurrence_window: usize,
    /// Extra export of the theme table; `Json` writes the record only.
    pub export_format: ExportFormat,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            significant_terms: DEFAULT_SIGNIFICANT_TERMS,
            context_window: DEFAULT_CONTEXT_WINDOW,
            cooccurrence_window: DEFAULT_COOCCURRENCE_WINDOW,
            export_format: ExportFormat::Json,
        }
    }
}

/// Term frequency table that preserves first-insertion order.
///
/// The insertion order is load-bearing: frequency ties in every ranking
/// resolve to first-encountered order, and gap examples are reported in the
/// order terms entered the table.
#[derive(Debug, Default, Clone)]
pub struct FrequencyTable {
    counts: HashMap<String, u32>,
    order: Vec<String>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `term`.
    pub fn add(&mut self, term: &str) {
        self.add_count(term, 1);
    }

    /// Add `n` occurrences of `term`.
    pub fn add_count(&mut self, term: &str, n: u32) {
        use std::collections::hash_map::Entry;
        match self.counts.entry(term.to_owned()) {
            Entry::Occupied(mut e) => *e.get_mut() += n,
            Entry::Vacant(e) => {
                e.insert(n);
                self.order.push(term.to_owned());
            }
        }
    }

    /// Count for `term`, zero if absent.
    pub fn get(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn unique_terms(&self) -> usize {
        self.order.len()
    }

    /// Sum of all counts.
    pub fn total_terms(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The `n` most frequent terms, count descending. Ties keep
    /// first-insertion order (the sort is stable).
    pub fn most_common(&self, n: usize) -> Vec<(String, u32)> {
        let mut entries: Vec<(String, u32)> = self
            .order
            .iter()
            .map(|t| (t.clone(), self.counts[t]))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }

    /// Terms with a count of exactly one, in first-insertion order.
    pub fn singletons(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|t| self.counts[*t] == 1)
            .cloned()
            .collect()
    }
}

/// Symmetric term co-occurrence graph.
///
/// Both directions of a pair are updated in one [`record`](Self::record)
/// call, so `strength(a, b) == strength(b, a)` holds structurally rather
/// than by convention.
#[derive(Debug, Default, Clone)]
pub struct CooccurrenceGraph {
    edges: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CooccurrenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one co-occurrence of `a` and `b`, in both directions.
    pub fn record(&mut self, a: &str, b: &str) {
        *self
            .edges
            .entry(a.to_owned())
            .or_default()
            .entry(b.to_owned())
            .or_insert(0) += 1;
        *self
            .edges
            .entry(b.to_owned())
            .or_default()
            .entry(a.to_owned())
            .or_insert(0) += 1;
    }

    /// Pairwise count, zero if the pair never co-occurred.
    pub fn strength(&self, a: &str, b: &str) -> u32 {
        self.edges
            .get(a)
            .and_then(|n| n.get(b))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_neighbors(&self, term: &str) -> bool {
        self.edges.get(term).is_some_and(|n| !n.is_empty())
    }

    /// Terms with at least one recorded neighbor.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// The `n` strongest neighbors of `term`, strength descending, ties
    /// alphabetical.
    pub fn strongest(&self, term: &str, n: usize) -> Vec<(String, u32)> {
        let mut neighbors: Vec<(String, u32)> = self
            .edges
            .get(term)
            .map(|m| m.iter().map(|(t, &c)| (t.clone(), c)).collect())
            .unwrap_or_default();
        neighbors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        neighbors.truncate(n);
        neighbors
    }
}

/// A co-occurring neighbor of a theme term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTerm {
    pub term: String,
    pub strength: u32,
}

/// A ranked theme with its neighborhood and sample contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeRecord {
    pub term: String,
    pub frequency: u32,
    pub importance: f64,
    pub related_terms: Vec<RelatedTerm>,
    pub sample_contexts: Vec<String>,
}

/// A central term grouped with its strongest co-occurring neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub central_term: String,
    pub related_terms: Vec<String>,
    pub cohesion: usize,
    pub total_mentions: u64,
}

/// Terms mentioned exactly once, treated as underexplored-topic signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub count: usize,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStatistics {
    pub unique_terms: usize,
    pub total_terms: u64,
}

/// Full per-document analysis record. Field order matches the JSON output
/// contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source_file: String,
    pub dominant_themes: Vec<ThemeRecord>,
    pub emerging_themes: Vec<ThemeRecord>,
    pub concept_clusters: Vec<ClusterRecord>,
    pub potential_gaps: GapReport,
    pub corpus_statistics: CorpusStatistics,
}

/// A theme term with its frequency summed across a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusTheme {
    pub term: String,
    pub total_frequency: u64,
}

/// A document that failed analysis, with the triggering message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDocument {
    pub filename: String,
    pub error: String,
}

/// Corpus-level aggregate produced by batch mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedInsights {
    pub total_documents: usize,
    pub successful_analyses: usize,
    pub failed_documents: Vec<FailedDocument>,
    pub top_themes_across_corpus: Vec<CorpusTheme>,
}

/// Outcome of analyzing one document, including the written output paths.
#[derive(Debug)]
pub struct FileReport {
    pub result: AnalysisResult,
    pub json_path: PathBuf,
    pub report_path: PathBuf,
    pub table_path: Option<PathBuf>,
    /// Human-readable report body, printed to stdout by the CLI.
    pub summary: String,
}

/// Outcome of a per-file run over a path.
#[derive(Debug)]
pub struct RunReport {
    pub reports: Vec<FileReport>,
    /// `(file, error)` pairs for documents that could not be analyzed.
    pub failed_files: Vec<(String, String)>,
}

/// Outcome of a batch run with corpus aggregation.
#[derive(Debug)]
pub struct BatchReport {
    pub reports: Vec<FileReport>,
    pub failed_files: Vec<(String, String)>,
    pub combined: CombinedInsights,
    pub combined_path: PathBuf,
    pub summary: String,
}

/// Strip the metadata preamble, if present.
pub fn skip_metadata(content: &str) -> &str {
    match content.split_once(METADATA_MARKER) {
        Some((_, body)) => body,
        None => content,
    }
}

/// Normalize raw text into an ordered, non-deduplicated sequence of terms.
///
/// Lowercases the input, extracts maximal runs of alphabet characters, and
/// drops runs shorter than three characters or present in the stopword set.
/// Deterministic and side-effect-free.
pub fn extract_terms(text: &str, profile: &LanguageProfile) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !profile.is_term_char(c))
        .filter(|w| w.chars().count() >= MIN_TERM_LEN && !profile.is_stopword(w))
        .map(str::to_owned)
        .collect()
}

/// Aggregate term occurrence counts in a single linear pass.
pub fn count_terms(terms: &[String]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for term in terms {
        table.add(term);
    }
    table
}

/// Case-folded view of a document with stable character indexing.
///
/// All window arithmetic in the pipeline is in characters, not bytes, so the
/// original text and its lowercase counterpart are kept as parallel char
/// sequences. Folding each char to the first scalar of its lowercase form
/// keeps the two sequences the same length; snippets are sliced from the
/// original so they keep the document's casing.
struct FoldedText {
    original: Vec<char>,
    lowered: Vec<char>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let original: Vec<char> = text.chars().collect();
        let lowered = original
            .iter()
            .map(|c| c.to_lowercase().next().unwrap_or(*c))
            .collect();
        Self { original, lowered }
    }

    fn len(&self) -> usize {
        self.lowered.len()
    }

    /// First occurrence of `needle` at or after `from`, as a plain substring.
    fn find(&self, needle: &[char], from: usize) -> Option<usize> {
        if needle.is_empty() || from >= self.lowered.len() {
            return None;
        }
        self.lowered[from..]
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|i| from + i)
    }

    /// Whether the match at `pos..pos+len` stands on word boundaries.
    fn is_word_occurrence(&self, pos: usize, len: usize) -> bool {
        let boundary = |c: char| !c.is_alphanumeric() && c != '_';
        (pos == 0 || boundary(self.lowered[pos - 1]))
            && (pos + len == self.lowered.len() || boundary(self.lowered[pos + len]))
    }

    /// Positions of whole-word occurrences of `needle`, left to right.
    fn word_positions(&self, needle: &[char]) -> Vec<usize> {
        let mut positions = Vec::new();
        let mut from = 0;
        while let Some(pos) = self.find(needle, from) {
            if self.is_word_occurrence(pos, needle.len()) {
                positions.push(pos);
                from = pos + needle.len();
            } else {
                from = pos + 1;
            }
        }
        positions
    }

    /// Whether `needle` occurs as a substring inside `[start, end)`.
    fn contains_within(&self, needle: &[char], start: usize, end: usize) -> bool {
        let end = end.min(self.lowered.len());
        if needle.is_empty() || start >= end || needle.len() > end - start {
            return false;
        }
        self.lowered[start..end]
            .windows(needle.len())
            .any(|w| w == needle)
    }

    /// Original-case substring `[start, end)`, trimmed of surrounding
    /// whitespace.
    fn snippet(&self, start: usize, end: usize) -> String {
        self.original[start..end.min(self.original.len())]
            .iter()
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Capture up to three bounded context snippets per significant term.
///
/// Occurrences are found case-insensitively with non-overlapping substring
/// search; each snippet spans `window` characters on either side of the
/// match, clipped to the document bounds and trimmed.
pub fn sample_contexts(
    text: &str,
    significant: &[String],
    window: usize,
) -> HashMap<String, Vec<String>> {
    sample_contexts_folded(&FoldedText::new(text), significant, window)
}

fn sample_contexts_folded(
    folded: &FoldedText,
    significant: &[String],
    window: usize,
) -> HashMap<String, Vec<String>> {
    let mut contexts = HashMap::new();
    for term in significant {
        let needle: Vec<char> = term.chars().collect();
        let mut snippets = Vec::new();
        let mut from = 0;
        while snippets.len() < MAX_CONTEXTS_PER_TERM {
            let Some(pos) = folded.find(&needle, from) else {
                break;
            };
            let start = pos.saturating_sub(window);
            let end = (pos + needle.len() + window).min(folded.len());
            snippets.push(folded.snippet(start, end));
            from = pos + needle.len();
        }
        contexts.insert(term.clone(), snippets);
    }
    contexts
}

/// Build the symmetric proximity graph over the significant terms.
///
/// For every whole-word occurrence of a term, any other significant term
/// whose text appears as a substring inside the surrounding `window`
/// characters counts as one co-occurrence. Pairs accumulate across repeated
/// windows; both directions are updated in one step.
pub fn build_cooccurrences(text: &str, significant: &[String], window: usize) -> CooccurrenceGraph {
    build_cooccurrences_folded(&FoldedText::new(text), significant, window)
}

fn build_cooccurrences_folded(
    folded: &FoldedText,
    significant: &[String],
    window: usize,
) -> CooccurrenceGraph {
    let chars: Vec<Vec<char>> = significant.iter().map(|t| t.chars().collect()).collect();
    let mut graph = CooccurrenceGraph::new();
    for (i, term) in significant.iter().enumerate() {
        for pos in folded.word_positions(&chars[i]) {
            let start = pos.saturating_sub(window);
            let end = (pos + window).min(folded.len());
            for (j, other) in significant.iter().enumerate().skip(i + 1) {
                if folded.contains_within(&chars[j], start, end) {
                    graph.record(term, other);
                }
            }
        }
    }
    graph
}

/// Frequency adjusted by a diminishing-return factor, rounded to two
/// decimals. Monotonically increasing in frequency: the correction never
/// promotes a lower-frequency term above a higher-frequency one.
pub fn importance_score(frequency: u32) -> f64 {
    let f = f64::from(frequency);
    let raw = f * (1.0 + 1.0 / (1.0 + f));
    (raw * 100.0).round() / 100.0
}

/// Score and order the top terms into the theme ranking.
///
/// Takes the top 30 terms by frequency, attaches up to five related terms
/// and up to three sample contexts to each, and sorts by importance
/// descending. The sort is stable, so importance ties keep the underlying
/// count-then-insertion order.
pub fn rank_themes(
    frequencies: &FrequencyTable,
    contexts: &HashMap<String, Vec<String>>,
    graph: &CooccurrenceGraph,
) -> Vec<ThemeRecord> {
    let mut ranked: Vec<ThemeRecord> = frequencies
        .most_common(RANKED_POOL)
        .into_iter()
        .map(|(term, frequency)| {
            let related_terms = graph
                .strongest(&term, MAX_RELATED_TERMS)
                .into_iter()
                .map(|(term, strength)| RelatedTerm { term, strength })
                .collect();
            let sample_contexts = contexts.get(&term).cloned().unwrap_or_default();
            ThemeRecord {
                importance: importance_score(frequency),
                term,
                frequency,
                related_terms,
                sample_contexts,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Group ranked themes with their strongest neighbors into clusters.
///
/// Walks the top 20 ranked themes and produces at most five clusters. Only
/// central terms are deduplicated; a term may appear as a related term in
/// any number of clusters. Themes without neighbors are skipped.
pub fn build_clusters(ranked: &[ThemeRecord], frequencies: &FrequencyTable) -> Vec<ClusterRecord> {
    let mut clusters = Vec::new();
    let mut used_central: HashSet<&str> = HashSet::new();
    for theme in ranked.iter().take(CLUSTER_POOL) {
        if clusters.len() == MAX_CLUSTERS {
            break;
        }
        if used_central.contains(theme.term.as_str()) || theme.related_terms.is_empty() {
            continue;
        }
        let related_terms: Vec<String> = theme
            .related_terms
            .iter()
            .take(CLUSTER_RELATED_TERMS)
            .map(|r| r.term.clone())
            .collect();
        let total_mentions = u64::from(frequencies.get(&theme.term))
            + related_terms
                .iter()
                .map(|t| u64::from(frequencies.get(t)))
                .sum::<u64>();
        clusters.push(ClusterRecord {
            central_term: theme.term.clone(),
            cohesion: related_terms.len() + 1,
            related_terms,
            total_mentions,
        });
        used_central.insert(theme.term.as_str());
    }
    clusters
}

/// Flag terms mentioned exactly once as potential coverage gaps.
pub fn detect_gaps(frequencies: &FrequencyTable) -> GapReport {
    let singletons = frequencies.singletons();
    GapReport {
        count: singletons.len(),
        examples: singletons.into_iter().take(MAX_GAP_EXAMPLES).collect(),
    }
}

/// Run the full pipeline over already-extracted text.
///
/// Empty text is not an error: the result is well-formed with zero counts
/// and empty lists.
pub fn analyze_text(
    text: &str,
    source_file: &str,
    profile: &LanguageProfile,
    opts: &AnalysisOptions,
) -> AnalysisResult {
    let body = skip_metadata(text);
    let terms = extract_terms(body, profile);
    let frequencies = count_terms(&terms);

    let significant: Vec<String> = frequencies
        .most_common(opts.significant_terms)
        .into_iter()
        .map(|(term, _)| term)
        .collect();

    let folded = FoldedText::new(body);
    let contexts = sample_contexts_folded(&folded, &significant, opts.context_window);
    let graph = build_cooccurrences_folded(&folded, &significant, opts.cooccurrence_window);

    let ranked = rank_themes(&frequencies, &contexts, &graph);
    let concept_clusters = build_clusters(&ranked, &frequencies);
    let dominant_themes: Vec<ThemeRecord> = ranked.iter().take(MAX_DOMINANT).cloned().collect();
    let emerging_themes: Vec<ThemeRecord> = ranked
        .iter()
        .filter(|t| (EMERGING_MIN..=EMERGING_MAX).contains(&t.frequency))
        .take(MAX_EMERGING)
        .cloned()
        .collect();
    let potential_gaps = detect_gaps(&frequencies);

    AnalysisResult {
        source_file: source_file.to_owned(),
        dominant_themes,
        emerging_themes,
        concept_clusters,
        potential_gaps,
        corpus_statistics: CorpusStatistics {
            unique_terms: frequencies.unique_terms(),
            total_terms: frequencies.total_terms(),
        },
    }
}

/// Sum dominant-theme frequencies across documents into the top-20 corpus
/// ranking. Only dominant themes contribute; nothing else is merged across
/// documents.
pub fn combine_rankings<'a>(
    results: impl IntoIterator<Item = &'a AnalysisResult>,
) -> Vec<CorpusTheme> {
    let mut totals = FrequencyTable::new();
    for result in results {
        for theme in &result.dominant_themes {
            totals.add_count(&theme.term, theme.frequency);
        }
    }
    totals
        .most_common(COMBINED_RANKING)
        .into_iter()
        .map(|(term, count)| CorpusTheme {
            term,
            total_frequency: u64::from(count),
        })
        .collect()
}

/// Collect analyzable documents under `path`, sorted for deterministic
/// batch output. A single file is returned as-is.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| DOCUMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Read a document, treating unreadable content as empty rather than fatal.
fn read_document(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("could not read {}: {e}; analyzing as empty", path.display());
            String::new()
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned())
}

/// Analyze a single document and write its JSON record and report into
/// `output_dir`.
pub fn analyze_file(
    path: &Path,
    output_dir: &Path,
    profile: &LanguageProfile,
    opts: &AnalysisOptions,
) -> Result<FileReport, AnalysisError> {
    if !path.exists() {
        return Err(AnalysisError::NotFound(path.to_path_buf()));
    }
    let text = read_document(path);
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let result = analyze_text(&text, &source, profile, opts);

    fs::create_dir_all(output_dir).map_err(|e| AnalysisError::Write {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let stem = file_stem(path);
    let json_path = report::write_json(&result, output_dir, &stem)?;
    let report_path = report::write_report(&result, output_dir, &stem)?;
    let table_path = match opts.export_format {
        ExportFormat::Json => None,
        format => Some(report::write_theme_table(&result, output_dir, &stem, format)?),
    };
    debug!(
        "analyzed {} ({} unique terms, {} occurrences)",
        path.display(),
        result.corpus_statistics.unique_terms,
        result.corpus_statistics.total_terms
    );

    Ok(FileReport {
        summary: render_report(&result),
        result,
        json_path,
        report_path,
        table_path,
    })
}

/// Analyze every document under `path` independently.
///
/// Per-document failures are captured into `failed_files` and do not abort
/// the remaining documents.
pub fn analyze_path(
    path: &Path,
    output_dir: &Path,
    profile: &LanguageProfile,
    opts: &AnalysisOptions,
) -> Result<RunReport, AnalysisError> {
    if !path.exists() {
        return Err(AnalysisError::NotFound(path.to_path_buf()));
    }
    let mut reports = Vec::new();
    let mut failed_files = Vec::new();
    for file in collect_files(path) {
        match analyze_file(&file, output_dir, profile, opts) {
            Ok(report) => reports.push(report),
            Err(e) => failed_files.push((file.display().to_string(), e.to_string())),
        }
    }
    Ok(RunReport {
        reports,
        failed_files,
    })
}

/// Analyze a batch of documents and add a combined corpus ranking.
///
/// Every document runs through the full pipeline on its own; only the
/// dominant-theme frequencies are summed across documents. Co-occurrence
/// graphs, clusters, and context snippets are never merged.
pub fn analyze_path_combined(
    path: &Path,
    output_dir: &Path,
    profile: &LanguageProfile,
    opts: &AnalysisOptions,
) -> Result<BatchReport, AnalysisError> {
    if !path.exists() {
        return Err(AnalysisError::NotFound(path.to_path_buf()));
    }
    let files = collect_files(path);
    if files.is_empty() {
        return Err(AnalysisError::NoDocuments(path.to_path_buf()));
    }

    let mut reports = Vec::new();
    let mut failed_files: Vec<(String, String)> = Vec::new();
    for file in &files {
        match analyze_file(file, output_dir, profile, opts) {
            Ok(report) => reports.push(report),
            Err(e) => failed_files.push((file.display().to_string(), e.to_string())),
        }
    }

    let combined = CombinedInsights {
        total_documents: files.len(),
        successful_analyses: reports.len(),
        failed_documents: failed_files
            .iter()
            .map(|(filename, error)| FailedDocument {
                filename: filename.clone(),
                error: error.clone(),
            })
            .collect(),
        top_themes_across_corpus: combine_rankings(reports.iter().map(|r| &r.result)),
    };

    fs::create_dir_all(output_dir).map_err(|e| AnalysisError::Write {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let combined_path = report::write_combined_json(&combined, output_dir)?;
    let summary = report::render_combined_summary(&combined);

    Ok(BatchReport {
        reports,
        failed_files,
        combined,
        combined_path,
        summary,
    })
}

/// Print the failed-document list as a warning block on stderr.
pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!(
        "Warnings: {} document(s) could not be analyzed:",
        failed.len()
    );
    for (file, error) in failed {
        eprintln!("  {file}: {error}");
    }
}
