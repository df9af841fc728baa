use clap::{Parser, Subcommand, ValueEnum};
use diagflow::prelude::*;
use diagflow::session::NullStore;
use itertools::Itertools;
use std::io::{self, Write};
use std::path::PathBuf;

/// Guided diagnostic flow engine CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a diagflow.yaml configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Flow manifest to load (overrides the config)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Pre-built flow bundle to load (overrides the manifest)
    #[arg(short, long, global = true)]
    bundle: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and validate every flow, then list them
    Validate,
    /// Write the validated flows into a binary bundle
    Bundle {
        /// Output file
        output: PathBuf,
    },
    /// Decode a model or serial number
    Decode {
        #[arg(value_enum)]
        kind: DecodeKind,
        value: String,
        /// Equipment type whose decoder to use
        #[arg(short, long, default_value = "heater")]
        equipment: String,
        /// Brand, for brand-specific decoders
        #[arg(long, default_value = "")]
        brand: String,
    },
    /// Run a diagnostic session interactively
    Run {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        equipment: String,
        #[arg(long)]
        model: String,
        /// Continue the persisted session instead of starting over
        #[arg(short, long)]
        resume: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DecodeKind {
    Model,
    Serial,
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    };
    if cli.manifest.is_some() {
        config.manifest = cli.manifest.clone();
    }
    if cli.bundle.is_some() {
        config.bundle = cli.bundle.clone();
    }

    init_logger(&config.log_level);

    match cli.command {
        Commands::Validate => run_validate(&config),
        Commands::Bundle { output } => run_bundle(&config, &output),
        Commands::Decode {
            kind,
            value,
            equipment,
            brand,
        } => run_decode(kind, &value, &brand, &equipment),
        Commands::Run {
            brand,
            equipment,
            model,
            resume,
        } => run_session(&config, &brand, &equipment, &model, resume),
    }
}

fn init_logger(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();
}

fn load_store(config: &EngineConfig) -> FlowStore {
    let result = match (&config.bundle, &config.manifest) {
        (Some(bundle), _) => FlowStore::from_bundle_file(bundle),
        (None, Some(manifest)) => FlowStore::from_manifest(manifest),
        (None, None) => exit_with_error("No flows configured. Pass --manifest or --bundle."),
    };
    result.unwrap_or_else(|e| exit_with_error(&format!("Failed to load flows: {}", e)))
}

fn run_validate(config: &EngineConfig) {
    let store = load_store(config);
    println!("{} flows loaded and validated:", store.len());
    for flow in store.flows() {
        println!(
            "  -> {} [{} / {} / {}] '{}' ({} nodes)",
            flow.id,
            flow.brand,
            flow.equipment_type,
            flow.model,
            flow.title,
            flow.nodes.len()
        );
    }
}

fn run_bundle(config: &EngineConfig, output: &Path) {
    let store = load_store(config);
    store
        .save_bundle(output)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write bundle: {}", e)));
    println!("Wrote {} flows to '{}'", store.len(), output.display());
}

fn run_decode(kind: DecodeKind, value: &str, brand: &str, equipment: &str) {
    let registry = DecoderRegistry::default();
    let decoder = registry.lookup(brand, equipment).unwrap_or_else(|| {
        exit_with_error(&format!("No decoder registered for '{}'", equipment))
    });

    let json = match kind {
        DecodeKind::Model => serde_json::to_string_pretty(&decoder.decode_model(value)),
        DecodeKind::Serial => serde_json::to_string_pretty(&decoder.decode_serial(value)),
    };
    println!(
        "{}",
        json.unwrap_or_else(|e| exit_with_error(&format!("Failed to render result: {}", e)))
    );
}

fn run_session(config: &EngineConfig, brand: &str, equipment: &str, model: &str, resume: bool) {
    let store = load_store(config);
    let Some(flow) = store.find_flow(brand, equipment, model) else {
        println!(
            "No diagnostic flow exists yet for {} / {} / {}.",
            brand, equipment, model
        );
        return;
    };

    let session_store: Arc<dyn SessionStore> = match &config.session_dir {
        Some(dir) => Arc::new(FileStore::new(dir)),
        None => Arc::new(NullStore),
    };
    let builder = Session::builder(flow)
        .with_store(session_store)
        .with_config(config.session);
    let session = if resume {
        builder.resume()
    } else {
        builder.build()
    };
    let mut session =
        session.unwrap_or_else(|e| exit_with_error(&format!("Failed to start session: {}", e)));

    println!("\n--- {} ---", session.flow().title);
    println!("Commands: ':back' to go back, ':reset' to start over, ':quit' to leave.\n");

    loop {
        if let Some(record) = session.final_record() {
            print_final(&record);
            return;
        }

        let node = session.current_node();
        println!("[{}] {}", node.id, node.text);
        let prompt = match &node.kind {
            NodeKind::Number { unit, range, .. } => {
                let unit = unit.as_deref().unwrap_or("");
                match range {
                    Some((min, max)) => format!("Value in {} (expected {}-{})", unit, min, max),
                    None => format!("Value in {}", unit),
                }
            }
            NodeKind::YesNo { .. } => "Yes or No".to_string(),
            NodeKind::Choice { choices } => {
                format!("Choose [{}]", choices.iter().map(|c| &c.label).join(" | "))
            }
            NodeKind::Text { .. } => "Enter value".to_string(),
            NodeKind::Info { .. } => "Press Enter to continue".to_string(),
        };

        let line = prompt_for_input(&prompt, session.draft());
        match line.as_str() {
            ":quit" => return,
            ":back" => {
                if !session.go_back() {
                    println!("Already at the first question.");
                }
                continue;
            }
            ":reset" => {
                session.reset();
                continue;
            }
            _ => {}
        }

        let response = match (&session.current_node().kind, line.is_empty()) {
            (NodeKind::Info { .. }, true) => Response::Acknowledge,
            _ => Response::from(line),
        };

        match session.respond(response) {
            Ok(Step::Finished(record)) => {
                print_final(&record);
                return;
            }
            Ok(Step::Advanced { .. }) => {}
            Err(ResponseError::InvalidInput { message, .. }) => {
                println!("  -> Invalid value: {}", message)
            }
            Err(e) => println!("  -> {}", e),
        }
        println!();
    }
}

fn print_final(record: &FinalRecord) {
    println!("\nDiagnostic finished: {}", record.outcome);
    println!("  -> Result: {}", record.result);
    match serde_json::to_string_pretty(record) {
        Ok(json) => println!("\n{}", json),
        Err(e) => eprintln!("Failed to render the answer record: {}", e),
    }
}

/// Prompts the user and reads a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    if let Err(e) = io::stdout().flush() {
        exit_with_error(&format!("Failed to write to stdout: {}", e));
    }

    match io::stdin().read_line(&mut line) {
        Ok(0) => ":quit".to_string(),
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.unwrap_or("").to_string()
            } else {
                trimmed
            }
        }
        Err(e) => exit_with_error(&format!("Failed to read line: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
