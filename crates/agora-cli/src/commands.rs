//! CLI command implementations.

use crate::config::{AgoraConfig, CONFIG_DIR, CONFIG_FILE};
use agora_graph::{compute_centrality, GraphSnapshot, Metric, MultiDiGraph, PetgraphView};
use agora_ingest::{load_csv, IngestResult};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Initialize Agora in a directory.
pub fn init(path: &Path) -> Result<()> {
    let agora_dir = path.join(CONFIG_DIR);
    let config_path = agora_dir.join(CONFIG_FILE);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(&agora_dir)?;
    fs::write(
        &config_path,
        serde_json::to_string_pretty(&AgoraConfig::default())?,
    )?;

    println!("{} Initialized Agora in {}", "✓".green(), path.display());
    println!("  Run {} to rank participants", "agora rank <log.csv>".cyan());

    Ok(())
}

/// Load an interaction log, reporting progress and skipped rows.
fn load(csv: &Path, config: &AgoraConfig) -> Result<IngestResult> {
    let options = config.load_options()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Reading {}...", csv.display()));

    let result = load_csv(csv, &options);
    spinner.finish_and_clear();
    let result = result?;

    eprintln!(
        "{} Loaded {} rows ({} participants, {} interactions) in {}ms",
        "✓".green(),
        result.rows_read.to_string().cyan(),
        result.graph.node_count().to_string().cyan(),
        result.graph.edge_count().to_string().cyan(),
        result.duration_ms
    );

    if !result.skipped.is_empty() {
        eprintln!("\n{} {} rows skipped:", "⚠".yellow(), result.skipped.len());
        for (line, reason) in result.skipped.iter().take(5) {
            eprintln!("  line {} - {}", line.to_string().red(), reason);
        }
        if result.skipped.len() > 5 {
            eprintln!("  ... and {} more", result.skipped.len() - 5);
        }
    }

    Ok(result)
}

/// Show graph statistics.
pub fn stats(csv: &Path, config: &AgoraConfig) -> Result<()> {
    let result = load(csv, config)?;
    let stats = result.graph.stats();
    let components = PetgraphView::from_graph(&result.graph).weak_components();

    println!("{}", "Agora Status".cyan().bold());
    println!();
    println!("  {} {}", "Participants:".dimmed(), stats.node_count);
    println!("  {} {}", "Interactions:".dimmed(), stats.edge_count);
    println!("  {} {}", "Pairs:".dimmed(), stats.pair_count);
    println!("  {} {}", "Askers:".dimmed(), stats.askers);
    println!("  {} {}", "Responders:".dimmed(), stats.responders);
    println!("  {} {}", "Components:".dimmed(), components);

    Ok(())
}

/// Rank participants by one or all centrality metrics.
pub fn rank(
    csv: &Path,
    metric: Option<Metric>,
    top: Option<usize>,
    json: bool,
    config: &AgoraConfig,
) -> Result<()> {
    let result = load(csv, config)?;
    let scores = compute_centrality(&result.graph, &config.centrality())?;
    let top = top.unwrap_or(config.top);

    let metrics: Vec<Metric> = match metric {
        Some(m) => vec![m],
        None => Metric::ALL.to_vec(),
    };

    if json {
        let mut output = serde_json::Map::new();
        for m in &metrics {
            output.insert(m.to_string(), serde_json::to_value(scores.top(*m, top))?);
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for m in metrics {
        println!("\n{} {}", "Top by".bold(), m.to_string().cyan().bold());
        for (i, ranked) in scores.top(m, top).iter().enumerate() {
            println!(
                "  {:>3}. {} {}",
                i + 1,
                ranked.node,
                format_score(m, ranked.score).dimmed()
            );
        }
    }

    if !scores.hits_converged {
        eprintln!(
            "\n{} HITS did not converge within {} iterations",
            "⚠".yellow(),
            config.iterations
        );
    }

    Ok(())
}

fn format_score(metric: Metric, score: f64) -> String {
    match metric {
        Metric::InDegree | Metric::OutDegree => format!("({score})"),
        _ => format!("({score:.6})"),
    }
}

/// Export the whole graph to JSON.
pub fn export(csv: &Path, output: &Path, config: &AgoraConfig) -> Result<()> {
    let result = load(csv, config)?;
    write_snapshot(&result.graph.to_snapshot(), output)
}

/// Show who a participant asks and who asks them.
pub fn neighbors(csv: &Path, node: &str, config: &AgoraConfig) -> Result<()> {
    let result = load(csv, config)?;
    let graph = &result.graph;

    if !graph.contains_node(node) {
        println!("No participant named \"{}\"", node);
        return Ok(());
    }

    println!("{}", node.cyan().bold());
    println!(
        "  {} {} ({} distinct)",
        "Asked:".dimmed(),
        graph.out_degree(node),
        graph.neighbors(node).len()
    );
    print_links(graph, node, graph.neighbors(node), true);
    println!(
        "  {} {} ({} distinct)",
        "Answered:".dimmed(),
        graph.in_degree(node),
        graph.predecessors(node).len()
    );
    print_links(graph, node, graph.predecessors(node), false);

    Ok(())
}

fn print_links(graph: &MultiDiGraph, node: &str, others: Vec<&str>, outgoing: bool) {
    for other in others {
        let edges = if outgoing {
            graph.get_edges(node, other)
        } else {
            graph.get_edges(other, node)
        };
        let arrow = if outgoing { "→" } else { "←" };
        println!("    {} {} {}", arrow, other, format!("×{}", edges.len()).dimmed());
    }
}

/// Export the subgraph induced by the given participants.
pub fn subgraph(csv: &Path, nodes: &[String], output: &Path, config: &AgoraConfig) -> Result<()> {
    let result = load(csv, config)?;

    let missing: Vec<&str> = nodes
        .iter()
        .map(String::as_str)
        .filter(|n| !result.graph.contains_node(n))
        .collect();
    if !missing.is_empty() {
        eprintln!("{} Not in graph: {}", "⚠".yellow(), missing.join(", "));
    }

    let sub = result.graph.subgraph(nodes);
    println!("{} Extracted {}", "✓".green(), sub);
    write_snapshot(&sub.to_snapshot(), output)
}

fn write_snapshot(snapshot: &GraphSnapshot, path: &Path) -> Result<()> {
    fs::write(path, snapshot.to_json_pretty()?)?;
    println!("{} Exported to {}", "✓".green(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOG: &str = "\
question_id,question_user_id,response_user_id,question_sent
q1,alice,bob,2024-01-01
q2,alice,bob,2024-01-02
q3,carol,alice,2024-01-03
";

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempdir().unwrap();
        init(dir.path()).unwrap();

        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);
        let config = AgoraConfig::load(&path).unwrap();
        assert_eq!(config, AgoraConfig::default());

        // Second run leaves the file alone.
        init(dir.path()).unwrap();
    }

    #[test]
    fn test_subgraph_export() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("log.csv");
        let out = dir.path().join("sub.json");
        fs::write(&csv, LOG).unwrap();

        let nodes = vec!["alice".to_string(), "bob".to_string()];
        subgraph(&csv, &nodes, &out, &AgoraConfig::default()).unwrap();

        let snapshot: GraphSnapshot =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(snapshot.nodes, vec!["alice", "bob"]);
        assert_eq!(snapshot.edges.len(), 2);
        assert!(snapshot.edges.iter().all(|e| e.source == "alice"));
    }

    #[test]
    fn test_export_and_rank() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("log.csv");
        let out = dir.path().join("graph.json");
        fs::write(&csv, LOG).unwrap();

        let config = AgoraConfig::default();
        export(&csv, &out, &config).unwrap();
        let snapshot: GraphSnapshot =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(snapshot.edges.len(), 3);

        rank(&csv, Some(Metric::PageRank), Some(2), true, &config).unwrap();
        rank(&csv, None, None, false, &config).unwrap();
    }
}
