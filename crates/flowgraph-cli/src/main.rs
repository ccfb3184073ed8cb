//! Flow graph editor CLI.
//!
//! Provides the `flowgraph` binary: the editor's action surface (add node,
//! connect, field edits, delete, clear, export/import) as subcommands over a
//! flow JSON file. Every command loads the document, applies one mutation
//! through the same `flowgraph_core` engine a front-end would use, and
//! writes the document back on success.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use flowgraph_core::{
    DataKind, EdgeId, FlowError, FlowGraph, NodeId, Position, ProcessKind,
};
use flowgraph_persist::{export_json, load_from_path, save_to_path, PersistError};

/// Flow graph editor and tools.
#[derive(Parser)]
#[command(name = "flowgraph", about = "Node-based flow graph editor and tools")]
struct Cli {
    /// Path to the flow JSON file.
    #[arg(short, long, global = true, default_value = "flow.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create an empty flow file.
    New,

    /// Add a node to the flow.
    AddNode {
        /// Node kind to create.
        #[arg(short, long, value_enum, default_value_t = KindArg::Input)]
        kind: KindArg,

        /// Canvas X position.
        #[arg(short, long, default_value_t = 0.0)]
        x: f64,

        /// Canvas Y position.
        #[arg(short, long, default_value_t = 0.0)]
        y: f64,
    },

    /// Connect one node to another.
    Connect {
        /// Source node id.
        source: u64,
        /// Target node id.
        target: u64,
    },

    /// Remove a connection.
    Disconnect {
        /// Edge id to remove.
        edge: u64,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a node and every edge touching it.
    Delete {
        /// Node id to delete.
        node: u64,
    },

    /// Edit one or more fields of a node.
    Set {
        /// Node id to edit.
        node: u64,

        /// New display label.
        #[arg(long)]
        label: Option<String>,

        /// New single value (registry-checked for uniqueness).
        #[arg(long)]
        value: Option<String>,

        /// Lower range endpoint.
        #[arg(long)]
        from: Option<String>,

        /// Upper range endpoint.
        #[arg(long)]
        to: Option<String>,

        /// Switch between single and range entry.
        #[arg(long, value_enum)]
        data_kind: Option<DataKindArg>,

        /// Process applied by a processor node.
        #[arg(long, value_enum)]
        process: Option<ProcessArg>,

        /// Branch condition of a conditional node.
        #[arg(long)]
        condition: Option<String>,
    },

    /// Print the flow document to stdout.
    Show,

    /// Print the flow document to stdout (alias kept for symmetry with import).
    Export,

    /// Replace the flow file with a validated document read from another file.
    Import {
        /// Path of the document to import.
        input: PathBuf,
    },

    /// Remove every node, edge, and allocation.
    Clear,

    /// Print the generated labels still available for allocation.
    Labels,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Input,
    Plain,
    Conditional,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DataKindArg {
    Single,
    Range,
}

impl From<DataKindArg> for DataKind {
    fn from(arg: DataKindArg) -> Self {
        match arg {
            DataKindArg::Single => DataKind::Single,
            DataKindArg::Range => DataKind::Range,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProcessArg {
    Sum,
    Subtract,
    Multiply,
    Divide,
    Average,
    Concat,
}

impl From<ProcessArg> for ProcessKind {
    fn from(arg: ProcessArg) -> Self {
        match arg {
            ProcessArg::Sum => ProcessKind::Sum,
            ProcessArg::Subtract => ProcessKind::Subtract,
            ProcessArg::Multiply => ProcessKind::Multiply,
            ProcessArg::Divide => ProcessKind::Divide,
            ProcessArg::Average => ProcessKind::Average,
            ProcessArg::Concat => ProcessKind::Concat,
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    process::exit(run(cli));
}

/// Dispatches the parsed command.
///
/// Returns exit code: 0 = success, 1 = rejected operation (correct the
/// input and retry), 2 = I/O or format error.
fn run(cli: Cli) -> i32 {
    let file = cli.file;
    let result = match cli.command {
        Commands::New => {
            let graph = FlowGraph::new();
            save_to_path(&file, &graph).map(|()| {
                println!("created {}", file.display());
            })
        }
        Commands::AddNode { kind, x, y } => with_graph(&file, |graph| {
            let position = Position::new(x, y);
            let id = match kind {
                KindArg::Input => graph.add_node(position),
                KindArg::Plain => graph.add_plain_node(position),
                KindArg::Conditional => graph.add_conditional_node(position),
            };
            println!("added node {id}");
            Ok(())
        }),
        Commands::Connect { source, target } => with_graph(&file, |graph| {
            let edge = graph.connect(NodeId(source), NodeId(target))?;
            println!("connected {source} -> {target} (edge {edge})");
            Ok(())
        }),
        Commands::Disconnect { edge, yes } => {
            if !yes && !confirm("Do you want to delete this connection?") {
                println!("aborted");
                return 0;
            }
            with_graph(&file, |graph| {
                let removed = graph.disconnect(EdgeId(edge))?;
                println!("disconnected {} -> {}", removed.source, removed.target);
                Ok(())
            })
        }
        Commands::Delete { node } => with_graph(&file, |graph| {
            match graph.delete_node(NodeId(node)) {
                Some(removed) => println!("deleted node {} ({})", removed.id, removed.data.label),
                None => println!("node {node} not found, nothing deleted"),
            }
            Ok(())
        }),
        Commands::Set {
            node,
            label,
            value,
            from,
            to,
            data_kind,
            process,
            condition,
        } => with_graph(&file, |graph| {
            let id = NodeId(node);
            if let Some(kind) = data_kind {
                graph.set_data_kind(id, kind.into())?;
            }
            if let Some(label) = label {
                graph.set_label(id, label)?;
            }
            if let Some(value) = value {
                graph.set_value(id, value)?;
            }
            if let Some(from) = from {
                graph.set_from(id, from)?;
            }
            if let Some(to) = to {
                graph.set_to(id, to)?;
            }
            if let Some(process) = process {
                graph.set_process(id, process.into())?;
            }
            if let Some(condition) = condition {
                graph.set_condition(id, condition)?;
            }
            Ok(())
        }),
        Commands::Show | Commands::Export => load_from_path(&file).and_then(|graph| {
            let json = export_json(&graph)?;
            println!("{json}");
            Ok(())
        }),
        Commands::Import { input } => load_from_path(&input).and_then(|graph| {
            save_to_path(&file, &graph)?;
            println!(
                "imported {} ({} nodes, {} edges)",
                input.display(),
                graph.node_count(),
                graph.edge_count()
            );
            Ok(())
        }),
        Commands::Clear => with_graph(&file, |graph| {
            graph.clear();
            println!("cleared");
            Ok(())
        }),
        Commands::Labels => load_from_path(&file).map(|graph| {
            for label in graph.registry().available_labels() {
                println!("{label}");
            }
        }),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err}");
            exit_code_for(&err)
        }
    }
}

/// Loads the flow file, applies one mutation, and writes it back on success.
fn with_graph(
    file: &PathBuf,
    edit: impl FnOnce(&mut FlowGraph) -> Result<(), FlowError>,
) -> Result<(), PersistError> {
    let mut graph = load_from_path(file)?;
    edit(&mut graph)?;
    save_to_path(file, &graph)
}

/// Asks for confirmation on stdin; only an explicit `y`/`yes` proceeds.
fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Rejected operations are user-correctable (exit 1); anything touching the
/// file or document format is exit 2.
fn exit_code_for(err: &PersistError) -> i32 {
    match err {
        PersistError::Flow(_) => 1,
        PersistError::Parse(_)
        | PersistError::InvalidFormat { .. }
        | PersistError::KeyNotFound { .. }
        | PersistError::Io(_) => 2,
    }
}
