//! terrific-ext CLI
//!
//! Usage:
//!   terrific-ext [OPTIONS] [SOURCE]
//!
//! Options:
//!   -p, --page <FILE>       HTML page holding id-referenced and inline templates
//!   -d, --data <FILE>       Data context (JSON or TOML)
//!   -m, --module <FILE>     Module config (TOML)
//!   -r, --register <MODE>   Register module templates: inline, all or configured
//!   -v, --verbose           Debug logging on stderr
//!   -h, --help              Print help

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terrific_ext::config::load_context;
use terrific_ext::{
    Context, MarkupDocument, Module, ModuleConfig, ModuleError, Registration, Templates,
};

#[derive(Parser)]
#[command(name = "terrific-ext")]
#[command(about = "Render {{= expr }} micro-templates for front-end modules")]
struct Cli {
    /// Template id (looked up in --page) or literal template text; reads stdin if absent
    source: Option<String>,

    /// HTML page holding id-referenced and inline templates
    #[arg(short, long)]
    page: Option<PathBuf>,

    /// Data context file (JSON or TOML, by extension)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Module config file (TOML)
    #[arg(short, long)]
    module: Option<PathBuf>,

    /// Register the module's templates and render each: inline, all or configured
    #[arg(short, long)]
    register: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "terrific_ext=debug"
    } else {
        "terrific_ext=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load page
    let page = match &cli.page {
        Some(path) => match MarkupDocument::from_file(path) {
            Ok(doc) => doc,
            Err(e) => fail(&format!("Error reading page '{}': {}", path.display(), e)),
        },
        None => MarkupDocument::parse(""),
    };

    // Load data context
    let data = match &cli.data {
        Some(path) => match load_context(path) {
            Ok(ctx) => ctx,
            Err(e) => fail(&format!("Error loading data '{}': {}", path.display(), e)),
        },
        None => Context::new(),
    };

    // Load module config
    let config = match &cli.module {
        Some(path) => match ModuleConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => fail(&format!(
                "Error loading module config '{}': {}",
                path.display(),
                e
            )),
        },
        None => ModuleConfig::default(),
    };

    let mut templates = Templates::new(&page);

    if let Some(mode) = &cli.register {
        let registration = match mode.parse::<Registration>() {
            Ok(r) => r,
            Err(e) => fail(&format!("Error: {}", e)),
        };
        register(&page, &mut templates, config, registration, &data);
        return;
    }

    if cli.source.is_none() && io::stdin().is_terminal() {
        fail("Error: no template given. Pass a template id or text, or pipe one on stdin (see --help)");
    }

    // Read template source
    let source = match cli.source {
        Some(source) => source,
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                // Drop the final newline so it doesn't render as a trailing space
                Ok(_) => buffer.trim_end_matches(['\n', '\r']).to_string(),
                Err(e) => fail(&format!("Error reading from stdin: {}", e)),
            }
        }
    };

    match templates.render(&source, &data) {
        Ok(text) => println!("{}", text),
        Err(e) => fail(&format!("Error: {}", e.report(&source_label(&source)))),
    }
}

/// Register a module's templates and print each rendered with `data`
fn register(
    page: &MarkupDocument,
    templates: &mut Templates<&MarkupDocument>,
    config: ModuleConfig,
    registration: Registration,
    data: &Context,
) {
    // Scope to the module's element when the page has it, else the whole page
    let module = match &config.name {
        Some(name) => Module::discover(page)
            .into_iter()
            .find(|m| m.name() == name)
            .unwrap_or_else(|| Module::new(name.clone(), page.root())),
        None => Module::new("Module", page.root()),
    };
    let module = module.with_config(config);

    let registered = match module.register_templates(templates, registration) {
        Ok(registered) => registered,
        Err(ModuleError::Template { name, source, .. }) => {
            fail(&format!("Error in template '{}':\n{}", name, source.report(&name)))
        }
        Err(e) => fail(&format!("Error: {}", e)),
    };

    for (name, template) in &registered {
        println!("== {} ==", name);
        match template.render(data) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(&format!("Error rendering template '{}': {}", name, e)),
        }
    }
}

/// Short label for error reports about inline template text
fn source_label(source: &str) -> String {
    if terrific_ext::template::is_identifier(source) {
        format!("#{}", source)
    } else {
        "<template>".to_string()
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
