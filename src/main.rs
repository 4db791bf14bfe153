//! TSP-TW-F Benchmark Tools - Command Line Interface
//!
//! Generates and imports instances for external solvers and certifies the routes they return.

use clap::{Parser, Subcommand};
use tsptw_bench::generator::{GeneratorConfig, SyntheticGenerator};
use tsptw_bench::instance::ProblemInstance;
use tsptw_bench::solution::{Route, SolutionDocument};
use tsptw_bench::tsplib::TsplibImporter;
use tsptw_bench::validator::{simulate, SolutionValidator};

use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "tsptw-bench")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Instance generation, TSPLIB import and solution validation for TSP-TW-F")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random instance
    Generate {
        /// Number of cities (depot included)
        #[arg(short, long, default_value = "20")]
        n_cities: usize,

        /// Output file name (".json" is appended if missing)
        #[arg(short, long, default_value = "tsp_data.json")]
        output: PathBuf,

        /// Generate without fuel cost (a = b = 0)
        #[arg(long)]
        no_fuel: bool,

        /// Generate without binding time windows
        #[arg(long)]
        no_time: bool,

        /// Random seed; drawn from entropy and logged when omitted
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of instances; seeds are `seed, seed + 1, ...`
        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Convert a TSPLIB file (EUC_2D or GEO) into an instance document
    Import {
        /// Path to the .tsp file
        input: PathBuf,

        /// Output file (defaults to the input with a .json extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a solver's solution against an instance
    Validate {
        /// Instance document
        #[arg(short, long)]
        data: PathBuf,

        /// Solution document
        #[arg(short, long)]
        solution: PathBuf,

        /// Also write the edge trace as CSV
        #[arg(long)]
        trace_csv: Option<PathBuf>,
    },

    /// Analyze an instance document
    Analyze {
        /// Instance document
        #[arg(short, long)]
        data: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { n_cities, output, no_fuel, no_time, seed, count } => {
            let config = GeneratorConfig {
                disable_fuel: no_fuel,
                disable_time_windows: no_time,
            };
            generate_instances(n_cities, &output, config, seed, count);
        }

        Commands::Import { input, output } => {
            import_tsplib(&input, output);
        }

        Commands::Validate { data, solution, trace_csv } => {
            let passed = validate_solution(&data, &solution, trace_csv);
            std::process::exit(if passed { 0 } else { 1 });
        }

        Commands::Analyze { data } => {
            analyze_instance(&data);
        }
    }
}

fn with_json_extension(path: &Path) -> PathBuf {
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }
}

fn load_instance(path: &Path) -> ProblemInstance {
    match ProblemInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance {:?}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn generate_instances(
    n_cities: usize,
    output: &Path,
    config: GeneratorConfig,
    seed: Option<u64>,
    count: usize,
) {
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("Generating {} instance(s) of {} cities, seed {}", count, n_cities, seed);

    let generator = SyntheticGenerator::with_config(config);
    let specs: Vec<(usize, u64)> = (0..count as u64)
        .map(|i| (n_cities, seed.wrapping_add(i)))
        .collect();

    let instances = match generator.generate_batch(&specs) {
        Ok(instances) => instances,
        Err(e) => {
            eprintln!("Error generating instance: {}", e);
            std::process::exit(1);
        }
    };

    let output = with_json_extension(output);
    for (i, instance) in instances.iter().enumerate() {
        let path = if count == 1 {
            output.clone()
        } else {
            let stem = output.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
            output.with_file_name(format!("{}_{}.json", stem, i))
        };
        if let Err(e) = instance.save(&path) {
            eprintln!("Error writing {:?}: {}", path, e);
            std::process::exit(1);
        }
        eprintln!("Generated {:?} with {} cities (seed {})", path, instance.n(), specs[i].1);
    }
}

fn import_tsplib(input: &Path, output: Option<PathBuf>) {
    eprintln!("Converting {:?}...", input);

    let import = match TsplibImporter::new().from_file(input) {
        Ok(import) => import,
        Err(e) => {
            eprintln!("Error importing TSPLIB file: {}", e);
            std::process::exit(1);
        }
    };

    for warning in &import.warnings {
        eprintln!("Warning: {}", warning);
    }

    let out_path = output.unwrap_or_else(|| input.with_extension("json"));
    if let Err(e) = import.instance.save(&out_path) {
        eprintln!("Error writing {:?}: {}", out_path, e);
        std::process::exit(1);
    }

    eprintln!("Saved {:?}", out_path);
    if let Some(name) = &import.name {
        eprintln!("Name: {}", name);
    }
    eprintln!("Cities: {}", import.instance.n());
    eprintln!("Distance type: {}", import.edge_weight_type);
}

fn validate_solution(data: &Path, solution_path: &Path, trace_csv: Option<PathBuf>) -> bool {
    eprintln!("--- TSP-TW-F VALIDATOR ---");
    eprintln!("Data: {:?}", data);
    eprintln!("Solution: {:?}", solution_path);

    let instance = load_instance(data);
    let solution = match SolutionDocument::from_file(solution_path) {
        Ok(sol) => sol,
        Err(e) => {
            eprintln!("Error loading solution {:?}: {}", solution_path, e);
            std::process::exit(1);
        }
    };

    let report = SolutionValidator::new().validate(&instance, &solution);
    eprintln!("{}", report);

    if let Some(path) = trace_csv {
        let written = File::create(&path)
            .map_err(csv::Error::from)
            .and_then(|file| report.write_trace_csv(file));
        match written {
            Ok(()) => eprintln!("Trace written to {:?}", path),
            Err(e) => eprintln!("Failed to write trace {:?}: {}", path, e),
        }
    }

    report.is_pass()
}

fn analyze_instance(path: &Path) {
    let instance = load_instance(path);

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let sim = simulate(&instance, &Route::identity(instance.n()));
    println!("\nIdentity tour 0 -> 1 -> ... -> 0:");
    println!("  Distance: {:.2}", sim.total_distance);
    println!("  Fuel: {:.2}", sim.total_fuel);
    println!("  Lateness penalty: {:.2}", sim.total_penalty);
    println!("  Total cost: {:.2}", sim.total_cost);
    println!("  Finish time: {:.2}", sim.finish_time);
    let late = sim.trace.iter().filter(|e| e.penalty > 0.0).count();
    println!("  Late arrivals: {}/{}", late, sim.trace.len());
}
