//! Output writers and renderers for analysis results.
//!
//! Every analyzed document produces a detailed JSON record and a
//! human-readable Markdown report. The ranked theme table can additionally
//! be exported as CSV or TSV; cells are passed through [`csv_safe_cell`] so
//! exports open safely in spreadsheet applications.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use clap::ValueEnum;
use csv::WriterBuilder;

use crate::{AnalysisError, AnalysisResult, CombinedInsights};

/// Extra export format for the theme table. `Json` writes the detailed
/// record only; `Csv` and `Tsv` add a flat table next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
    Tsv,
}

/// Write the detailed JSON record, `<stem>_themes.json`.
///
/// Pretty-printed with two-space indentation; the payload carries no
/// wall-clock fields, so repeated runs over identical input are
/// byte-identical.
pub fn write_json(
    result: &AnalysisResult,
    output_dir: &Path,
    stem: &str,
) -> Result<PathBuf, AnalysisError> {
    let path = output_dir.join(format!("{stem}_themes.json"));
    let json = serde_json::to_string_pretty(result)?;
    fs::write(&path, json).map_err(|e| AnalysisError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Write the human-readable Markdown report, `<stem>_report.md`.
pub fn write_report(
    result: &AnalysisResult,
    output_dir: &Path,
    stem: &str,
) -> Result<PathBuf, AnalysisError> {
    let path = output_dir.join(format!("{stem}_report.md"));
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S");
    let content = format!(
        "# Theme Analysis Report\n\n**Generated:** {generated}\n\n{}",
        render_report(result)
    );
    fs::write(&path, content).map_err(|e| AnalysisError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Render the report body.
///
/// Section order is fixed: corpus statistics, dominant themes (with up to
/// two sample contexts each), concept clusters, emerging themes, potential
/// gaps. The same string is printed as the per-document stdout summary.
pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let stats = &result.corpus_statistics;
    out.push_str("## Corpus Statistics\n\n");
    out.push_str(&format!("- **Unique Terms:** {}\n", stats.unique_terms));
    out.push_str(&format!(
        "- **Total Term Occurrences:** {}\n\n",
        stats.total_terms
    ));

    out.push_str("## Dominant Themes\n\n");
    for theme in &result.dominant_themes {
        out.push_str(&format!("### {}\n\n", title_case(&theme.term)));
        out.push_str(&format!(
            "- **Frequency:** {} occurrences\n",
            theme.frequency
        ));
        out.push_str(&format!("- **Importance Score:** {}\n", theme.importance));
        if !theme.related_terms.is_empty() {
            out.push_str("- **Related Terms:**\n");
            for related in &theme.related_terms {
                out.push_str(&format!(
                    "  - {} (co-occurs {} times)\n",
                    related.term, related.strength
                ));
            }
        }
        if !theme.sample_contexts.is_empty() {
            out.push_str("\n**Sample Contexts:**\n");
            for (i, context) in theme.sample_contexts.iter().take(2).enumerate() {
                out.push_str(&format!("{}. \"...{}...\"\n\n", i + 1, context));
            }
        }
        out.push_str("\n---\n\n");
    }

    if !result.concept_clusters.is_empty() {
        out.push_str("## Concept Clusters\n\n");
        for cluster in &result.concept_clusters {
            out.push_str(&format!(
                "### Cluster: {}\n\n",
                title_case(&cluster.central_term)
            ));
            out.push_str(&format!(
                "- **Related Terms:** {}\n",
                cluster.related_terms.join(", ")
            ));
            out.push_str(&format!(
                "- **Total Mentions:** {}\n\n",
                cluster.total_mentions
            ));
        }
    }

    if !result.emerging_themes.is_empty() {
        out.push_str("## Emerging Themes\n\n");
        for theme in &result.emerging_themes {
            out.push_str(&format!(
                "- **{}** ({} mentions)\n",
                title_case(&theme.term),
                theme.frequency
            ));
        }
        out.push('\n');
    }

    let gaps = &result.potential_gaps;
    out.push_str("## Potential Research Gaps\n\n");
    out.push_str(&format!(
        "Found **{}** terms mentioned only once.\n\n",
        gaps.count
    ));
    out.push_str("Sample underrepresented topics:\n");
    for term in &gaps.examples {
        out.push_str(&format!("- {term}\n"));
    }

    out
}

/// Export the ranked theme table, `<stem>_themes.csv` or `.tsv`.
pub fn write_theme_table(
    result: &AnalysisResult,
    output_dir: &Path,
    stem: &str,
    format: ExportFormat,
) -> Result<PathBuf, AnalysisError> {
    let (ext, delimiter) = match format {
        ExportFormat::Csv => ("csv", b','),
        ExportFormat::Tsv => ("tsv", b'\t'),
        ExportFormat::Json => return write_json(result, output_dir, stem),
    };
    let path = output_dir.join(format!("{stem}_themes.{ext}"));
    let table_err = |source| AnalysisError::Table {
        path: path.clone(),
        source,
    };

    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(&path)
        .map_err(table_err)?;
    wtr.write_record(["list", "term", "frequency", "importance", "related_terms"])
        .map_err(table_err)?;
    let lists = [
        ("dominant", &result.dominant_themes),
        ("emerging", &result.emerging_themes),
    ];
    for (list, themes) in lists {
        for theme in themes {
            let related = theme
                .related_terms
                .iter()
                .map(|r| format!("{} ({})", r.term, r.strength))
                .collect::<Vec<_>>()
                .join("; ");
            wtr.write_record([
                list.to_string(),
                csv_safe_cell(theme.term.clone()),
                theme.frequency.to_string(),
                theme.importance.to_string(),
                csv_safe_cell(related),
            ])
            .map_err(table_err)?;
        }
    }
    wtr.flush().map_err(|e| AnalysisError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Write the corpus-level aggregate, `combined_themes.json`.
pub fn write_combined_json(
    combined: &CombinedInsights,
    output_dir: &Path,
) -> Result<PathBuf, AnalysisError> {
    let path = output_dir.join("combined_themes.json");
    let json = serde_json::to_string_pretty(combined)?;
    fs::write(&path, json).map_err(|e| AnalysisError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Render the combined-corpus summary printed after a batch run.
pub fn render_combined_summary(combined: &CombinedInsights) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Analyzed {} document(s): {} successful, {} failed.\n",
        combined.total_documents,
        combined.successful_analyses,
        combined.failed_documents.len()
    ));
    out.push_str("Top themes across corpus:\n");
    for theme in &combined.top_themes_across_corpus {
        out.push_str(&format!("  {}\t{}\n", theme.term, theme.total_frequency));
    }
    out
}

/// Neutralize spreadsheet formula injection in a CSV/TSV cell.
///
/// Cells starting with `=`, `+`, `-`, or `@` get a leading apostrophe;
/// cells already prefixed stay unchanged.
pub fn csv_safe_cell(cell: String) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{cell}"),
        _ => cell,
    }
}

fn title_case(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisOptions, LanguageProfile, analyze_text};

    fn sample_result() -> AnalysisResult {
        analyze_text(
            "Democracy requires participation. Participation strengthens democracy. \
             Freedom enables participation.",
            "sample.md",
            &LanguageProfile::default(),
            &AnalysisOptions::default(),
        )
    }

    #[test]
    fn report_sections_keep_fixed_order() {
        let out = render_report(&sample_result());
        let i_stats = out.find("## Corpus Statistics").unwrap();
        let i_dominant = out.find("## Dominant Themes").unwrap();
        let i_clusters = out.find("## Concept Clusters").unwrap();
        let i_emerging = out.find("## Emerging Themes").unwrap();
        let i_gaps = out.find("## Potential Research Gaps").unwrap();
        assert!(i_stats < i_dominant);
        assert!(i_dominant < i_clusters);
        assert!(i_clusters < i_emerging);
        assert!(i_emerging < i_gaps);
    }

    #[test]
    fn report_caps_contexts_at_two() {
        let out = render_report(&sample_result());
        assert!(out.contains("1. \"..."));
        assert!(!out.contains("3. \"..."));
    }

    #[test]
    fn safe_cell_neutralizes_formula_prefixes() {
        assert_eq!(
            csv_safe_cell(r#"=HYPERLINK("http://x")"#.to_string()),
            r#"'=HYPERLINK("http://x")"#
        );
        assert_eq!(csv_safe_cell("@cmd".to_string()), "'@cmd");
        assert_eq!(csv_safe_cell("+1".to_string()), "'+1");
    }

    #[test]
    fn safe_cell_leaves_safe_values_alone() {
        assert_eq!(csv_safe_cell("'@SAFE".to_string()), "'@SAFE");
        assert_eq!(csv_safe_cell("normal".to_string()), "normal");
        assert_eq!(csv_safe_cell(String::new()), "");
    }

    #[test]
    fn title_case_uppercases_first_letter() {
        assert_eq!(title_case("democracy"), "Democracy");
        assert_eq!(title_case("čas"), "Čas");
        assert_eq!(title_case(""), "");
    }
}
