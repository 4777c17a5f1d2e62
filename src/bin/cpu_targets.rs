//! Inspection tool for the target resolution engine.
//!
//! Dumps the detected host processor, resolves requested target lists the
//! way a code generator host would, and shows the resulting clone flags and
//! backend target strings. The target-spec syntax is
//! `name[,+feature,-feature,clone_all,base(N)][;next-target...]`; feature
//! tokens the registry does not know travel to the backend verbatim.

use clap::{Parser, Subcommand};

use cpu_targets::core::{serialize_targets, TargetData, TargetFlags, TargetSession};
use cpu_targets::x86;

#[derive(Parser)]
#[command(name = "cpu-targets", about = "CPU target resolution inspector")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the detected host microarchitecture and its feature set.
    Host,
    /// List every microarchitecture the registry knows.
    Cpus,
    /// Resolve a target spec against this host and show the outcome.
    Resolve {
        /// Target spec, e.g. "generic;skylake,-rdrnd;native".
        spec: String,
        /// Resolve for image building: annotate clone flags for every
        /// entry and report the serialized list size.
        #[arg(long)]
        image: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Host => dump_host(),
        Command::Cpus => list_cpus(),
        Command::Resolve { spec, image } => resolve(&spec, image),
    }
}

fn dump_host() {
    let tables = x86::tables();
    let host = x86::host_info();
    println!("host: {}", host.name);
    let names: Vec<&str> = tables
        .features
        .iter()
        .filter(|f| host.features.test(f.bit))
        .map(|f| f.name)
        .collect();
    println!("features ({}): {}", names.len(), names.join(" "));
}

fn list_cpus() {
    let tables = x86::tables();
    for spec in tables.cpus {
        let gate = if spec.min_toolchain > 0 {
            format!(" (toolchain {}+)", spec.min_toolchain)
        } else {
            String::new()
        };
        println!(
            "{:<16} {:>3} features{}",
            spec.name,
            spec.features.count(),
            gate
        );
    }
}

fn resolve(spec: &str, image: bool) {
    let tables = x86::tables();
    let requests = parse_spec(spec);
    let mut session = TargetSession::new(tables, x86::host_info());
    let targets = if image {
        session.image_targets(&requests)
    } else {
        session.ensure_targets(&requests);
        session.targets().to_vec()
    };
    for (i, target) in targets.iter().enumerate() {
        let backend = session.backend_target(target);
        println!("[{i}] {}", target.name);
        if target.has_unknown_name() {
            println!("    warning: unknown microarchitecture name");
        }
        println!("    enabled: {} features", target.enabled.count());
        println!("    flags: {:?} (base {})", target.flags, target.base);
        println!("    backend: {} {}", backend.cpu, backend.features_str());
    }
    if image {
        let bytes = serialize_targets(&targets);
        println!("serialized target list: {} bytes", bytes.len());
    }
}

/// Parse the textual target spec into tokenized request records. This is
/// the command-line collaborator of the engine; the library itself only
/// ever sees the records.
fn parse_spec(spec: &str) -> Vec<TargetData<{ x86::FEATURE_WORDS }>> {
    let tables = x86::tables();
    let mut requests = Vec::new();
    for part in spec.split(';').filter(|p| !p.trim().is_empty()) {
        let mut tokens = part.split(',').map(str::trim);
        let name = tokens.next().unwrap_or_default();
        let mut target = TargetData::request(name, &[], &[], "");
        let mut ext = Vec::new();
        for token in tokens.filter(|t| !t.is_empty()) {
            if token == "clone_all" {
                target.flags |= TargetFlags::CLONE_ALL;
            } else if let Some(base) = token
                .strip_prefix("base(")
                .and_then(|t| t.strip_suffix(')'))
            {
                match base.parse() {
                    Ok(base) => target.base = base,
                    Err(_) => {
                        eprintln!("invalid base index in `{token}`");
                        std::process::exit(1);
                    }
                }
            } else if let Some(feature) = token.strip_prefix('+') {
                match tables.find_feature_bit(feature) {
                    Some(bit) => target.enabled.set(bit),
                    None => ext.push(token.to_string()),
                }
            } else if let Some(feature) = token.strip_prefix('-') {
                match tables.find_feature_bit(feature) {
                    Some(bit) => target.disabled.set(bit),
                    None => ext.push(token.to_string()),
                }
            } else {
                eprintln!("invalid feature token `{token}`; expected +name or -name");
                std::process::exit(1);
            }
        }
        target.ext_features = ext.join(",");
        requests.push(target);
    }
    requests
}
