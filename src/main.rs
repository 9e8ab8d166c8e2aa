use rtml::{RtmlEngine, RtmlVersion};
use std::env;
use std::io::{self, Write};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-rtml-file> [--to <2.2|3.1a>]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let mut target: Option<RtmlVersion> = None;
    // Parse --to argument
    if let Some(to_idx) = args.iter().position(|arg| arg == "--to") {
        match args.get(to_idx + 1).map(|v| v.parse::<RtmlVersion>()) {
            Some(Ok(version)) => target = Some(version),
            Some(Err(e)) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!("ERROR: --to flag requires an argument.");
                std::process::exit(1);
            }
        }
    }

    let engine = RtmlEngine::default();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}", path);
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let (document, diagnostics) = match engine.parse_bytes_with_diagnostics(&bytes) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("\nERROR: Failed to parse RTML document");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    // With --to the document goes to stdout, so the summary moves to stderr
    let mut summary: Box<dyn Write> = if target.is_some() {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let _ = writeln!(summary, "RTML document: {}", path);
    let _ = writeln!(summary, "{}", "=".repeat(60));
    let _ = writeln!(summary, "  Version: {}", document.version);
    let _ = writeln!(summary, "  Kind: {}", document.kind);
    if let Some(uid) = document.uid() {
        let _ = writeln!(summary, "  Id: {}", uid);
    }
    if let Some(project) = &document.project {
        let _ = writeln!(summary, "  Project: {}", project.id);
    }
    let _ = writeln!(summary, "  Observations: {}", document.observations.len());
    for (i, observation) in document.observations.iter().enumerate() {
        let target = &observation.target;
        let name = target.name.as_deref().unwrap_or("(unnamed)");
        let position = match (&target.ra, &target.dec) {
            (Some(ra), Some(dec)) => format!("{} {}", ra, dec),
            _ => "(no coordinates)".to_string(),
        };
        let _ = writeln!(
            summary,
            "  {}. {} [{}] {} images={}",
            i + 1,
            name,
            target.kind.as_str(),
            position,
            observation.image_data.len()
        );
    }
    if let Some(error) = &document.error_string {
        let _ = writeln!(summary, "  Error: {}", error);
    }
    if !diagnostics.is_clean() {
        let _ = writeln!(summary, "\nWarnings ({}):", diagnostics.len());
        for message in diagnostics.warnings.iter().chain(&diagnostics.errors) {
            let _ = writeln!(summary, "  - {}", message);
        }
    }

    if let Some(version) = target {
        match engine.create(&document.to_version(version)) {
            Ok(out) => {
                if let Err(e) = io::stdout().write_all(&out) {
                    eprintln!("ERROR: Failed to write output: {}", e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("\nERROR: Failed to write RTML {} document", version);
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        }
    }
}
