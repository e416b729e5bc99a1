use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

use ahash::AHashSet;
use anyhow::{bail, ensure, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use cpa_utils::{
    builtins,
    context::AnalysisContext,
    graph::{
        edge_list::{read_edge_list, write_edge_list},
        find_all_elementary_cycles, find_sccs, DiGraph, NodeIndex,
    },
    machine_model::{CType, FloatKind, IntegerKind, MachineModel},
    process::{cbmc::CbmcExecutor, cilly::Cilly},
    strings::format_ranges,
};
use itertools::Itertools;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cpa-utils",
    about = "Graph, builtin-function and external-tool helpers for program analysis."
)]
struct Cli {
    /// More log output (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Seed of the random number generator.
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the strongly connected components of an edge-list graph, one per line.
    Scc {
        /// Edge-list file, `-` for standard input.
        file: PathBuf,
    },
    /// Print every elementary cycle of an edge-list graph, one per line.
    Cycles { file: PathBuf },
    /// Print an edge-list graph in the DOT language.
    Dot { file: PathBuf },
    /// Print a random edge-list graph.
    Random {
        #[arg(long, value_name = "N")]
        nodes: usize,
        #[arg(long, value_name = "M")]
        edges: usize,
    },
    /// Classify function names as compiler or library builtins.
    Builtin {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Collapse integers into a range string such as `1,3-5,7`.
    Ranges {
        #[arg(allow_negative_numbers = true)]
        values: Vec<i64>,
    },
    /// Print the type sizes of a machine model.
    MachineModel {
        /// One of LINUX32, LINUX64, ARM, ARM64.
        model: String,
    },
    /// Run CBMC on a counterexample and report whether it is feasible.
    Cbmc {
        /// Directory containing the `cbmc` executable.
        #[arg(long, value_name = "DIR")]
        lib_path: PathBuf,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Simplify a C file with CIL.
    Cilly {
        #[arg(long)]
        simplify_mem: bool,
        /// Path of the CIL driver.
        #[arg(long, value_name = "FILE", default_value = "cilly.asm.exe")]
        executable: PathBuf,
        source: PathBuf,
        target: PathBuf,
    },
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // stdout carries the results
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .context("failed to initialise logging")
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let context = AnalysisContext::new(cli.seed);

    match cli.command {
        Command::Scc { file } => {
            let graph = load_graph(&file)?;
            for scc in find_sccs(&graph, &graph.node_indices(), &AHashSet::new()) {
                println!("{}", names(&graph, scc.nodes().iter()));
            }
        }
        Command::Cycles { file } => {
            let graph = load_graph(&file)?;
            let cycles =
                find_all_elementary_cycles(&graph, &graph.node_indices(), &AHashSet::new());
            info!("{} elementary cycles", cycles.len());
            for cycle in cycles {
                println!("{}", names(&graph, cycle.iter()));
            }
        }
        Command::Dot { file } => {
            let graph = load_graph(&file)?;
            print!("{}", graph.dot(|name| name.clone()));
        }
        Command::Random { nodes, edges } => {
            ensure!(nodes > 0 || edges == 0, "cannot place edges in an empty graph");
            let mut graph = DiGraph::new();
            for i in 0..nodes {
                graph.add_node(format!("n{i}"));
            }
            for _ in 0..edges {
                let from = NodeIndex(context.random.next_below(nodes));
                let to = NodeIndex(context.random.next_below(nodes));
                graph.add_edge(from, to);
            }
            let mut out = String::new();
            write_edge_list(&graph, &mut out)?;
            print!("{out}");
        }
        Command::Builtin { names } => {
            for name in names {
                match builtins::classify(&name) {
                    Some(builtin) => println!("{name}: {builtin}"),
                    None => println!("{name}: not a builtin"),
                }
            }
        }
        Command::Ranges { values } => println!("{}", format_ranges(values)),
        Command::MachineModel { model } => {
            let model = MachineModel::from_str(&model)?;
            print_machine_model(model);
        }
        Command::Cbmc { lib_path, args } => {
            let mut cbmc = CbmcExecutor::spawn(&lib_path, &args)
                .with_context(|| format!("failed to start cbmc from {}", lib_path.display()))?;
            cbmc.join().context("CBMC counterexample check failed")?;
            if cbmc.did_unwinding_assertion_fail() {
                info!("an unwinding assertion failed, the bound may be too small");
            }
            match cbmc.result() {
                Some(true) => println!("feasible"),
                Some(false) => println!("infeasible"),
                None => bail!("CBMC produced unexpected error output"),
            }
        }
        Command::Cilly {
            simplify_mem,
            executable,
            source,
            target,
        } => {
            Cilly::new()
                .executable(executable)
                .simple_mem(simplify_mem)
                .run(&source, &target)
                .with_context(|| format!("failed to simplify {}", source.display()))?;
        }
    }
    Ok(())
}

fn load_graph(path: &Path) -> Result<DiGraph<String>> {
    let reader: Box<dyn Read> = if path == Path::new("-") {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(path).with_context(|| format!("failed to open {}", path.display()))?)
    };
    read_edge_list(BufReader::new(reader))
        .with_context(|| format!("failed to read edge list {}", path.display()))
}

fn names<'a>(graph: &DiGraph<String>, nodes: impl Iterator<Item = &'a NodeIndex>) -> String {
    nodes.map(|n| &graph[*n]).join(" ")
}

fn print_machine_model(model: MachineModel) {
    let mut types = vec![CType::Bool, CType::Char];
    for kind in [
        IntegerKind::Short,
        IntegerKind::Int,
        IntegerKind::Long,
        IntegerKind::LongLong,
        IntegerKind::Int128,
    ] {
        types.push(CType::signed(kind));
    }
    types.extend([FloatKind::Float, FloatKind::Double, FloatKind::LongDouble].map(CType::Float));
    types.push(CType::Void.pointer_to());

    println!("{model} ({:?} endian)", model.endianness());
    for ty in &types {
        println!(
            "{:<12} size {:>2}  align {:>2}",
            ty.to_string(),
            model.sizeof(ty),
            model.alignof(ty)
        );
    }
    println!(
        "char is {}",
        if model.char_is_signed() { "signed" } else { "unsigned" }
    );
}
