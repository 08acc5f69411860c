use std::path::PathBuf;

/// Value of `--name=value`, if present and non-blank.
fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    args.iter()
        .find_map(|a| a.strip_prefix(prefix.as_str()))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!(
            "material-wizard [--config=<path>] [--project=<id>] [--print-config] [--tui-smoke[=<page>]]\n\
             \n\
             Smoke pages: {}",
            material_wizard::tui::SMOKE_TARGETS.join("|")
        );
        return;
    }

    let config_path = flag_value(&args, "--config").map(PathBuf::from);
    let settings = match material_wizard::config::load(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(2);
        }
    };

    if args.iter().any(|a| a == "--print-config") {
        if let Err(e) = material_wizard::print_config(&settings) {
            eprintln!("{:#}", e);
            std::process::exit(2);
        }
        return;
    }

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame for a specific page and exits 0.
    // Usage: --tui-smoke or --tui-smoke=chooser|notice|step1|...|review|complete
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        material_wizard::run_tui_smoke(&settings, target);
        return;
    }

    let project = flag_value(&args, "--project");
    material_wizard::run_tui(&settings, project.as_deref());
}
