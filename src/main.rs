use clap::Parser;
use eec::config::{self, CompilationSettings};
use eec::diagnostics::{CompileError, DiagnosticSink, TerminalSink};
use eec::modules::{Cluster, Export, FsLoader};
use eec::span::FileId;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eec", version, about = "Compile ee source to JavaScript")]
struct Cli {
    /// Source file path
    file: PathBuf,

    /// Do not import the std lib
    #[arg(long)]
    no_std: bool,

    /// Std lib path (overrides eec.toml)
    #[arg(long)]
    lib: Option<PathBuf>,

    /// Print JavaScript to stdout
    #[arg(long)]
    emit: bool,

    /// Write JavaScript to this path (defaults to <FILE>.js)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the module's exports and exit
    #[arg(long)]
    list_exports: bool,

    /// Print the module's types and exit
    #[arg(long)]
    list_types: bool,

    /// Print the AST as JSON and exit
    #[arg(long)]
    ast: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("eec=trace")
    } else {
        EnvFilter::try_from_env("EEC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn settings_for(cli: &Cli) -> Result<CompilationSettings, CompileError> {
    let dir = cli.file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut settings = config::load_settings(dir)?;
    if let Some(lib) = &cli.lib {
        settings.std_lib = Some(lib.clone());
    }
    Ok(settings)
}

fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect())
        .unwrap_or_else(|| "main".to_string())
}

fn run(cli: &Cli, sink: &mut dyn DiagnosticSink) -> Result<(), CompileError> {
    if cli.ast {
        let source = std::fs::read_to_string(&cli.file)
            .map_err(|e| CompileError::io(format!("could not read '{}': {e}", cli.file.display()), &cli.file))?;
        let statements = eec::parser::parse_source(FileId(0), source)?;
        let json = serde_json::to_string_pretty(&statements)
            .map_err(|e| CompileError::internal(format!("could not serialize the AST: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    let settings = settings_for(cli)?;
    let with_std = !cli.no_std && settings.std_lib.is_some();
    tracing::debug!(file = %cli.file.display(), with_std, "compiling");
    let mut cluster = Cluster::new(FsLoader, settings);

    if cli.list_exports || cli.list_types {
        let id = cluster.add_module(&module_name(&cli.file), &cli.file, with_std)?;
        let module = cluster
            .module(id)
            .ok_or_else(|| CompileError::internal("entry module was not kept after loading"))?;
        if cli.list_exports {
            for export in module.exports() {
                match export {
                    Export::Type { name, value } => println!("{name}: {value}"),
                    Export::Extension { name, table } => {
                        let methods: Vec<&str> = table.functions.iter().map(|(n, _)| n.as_str()).collect();
                        println!("extension {name} {{{}}}", methods.join(", "));
                    }
                }
            }
        }
        if cli.list_types {
            let mut types: Vec<_> = module.scope.types.iter().collect();
            types.sort_by(|a, b| a.0.cmp(b.0));
            for (name, ty) in types {
                println!("{name}: {ty}");
            }
        }
        return Ok(());
    }

    let js = cluster.build(&cli.file, with_std, sink)?;
    if cli.emit {
        println!("{js}");
        return Ok(());
    }
    let output = cli.output.clone().unwrap_or_else(|| cli.file.with_extension("js"));
    std::fs::write(&output, js)
        .map_err(|e| CompileError::io(format!("could not write '{}': {e}", output.display()), &output))?;
    tracing::debug!(output = %output.display(), "wrote JavaScript");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.trace);

    let mut sink = TerminalSink { color: std::io::stderr().is_terminal() };
    let mut reported = ReportOnce { inner: &mut sink, reported: false };
    if let Err(err) = run(&cli, &mut reported) {
        if !reported.reported {
            reported.inner.report(&err);
        }
        std::process::exit(1);
    }
}

/// `Cluster::build` reports its own error; everything else is reported here.
struct ReportOnce<'a> {
    inner: &'a mut dyn DiagnosticSink,
    reported: bool,
}

impl DiagnosticSink for ReportOnce<'_> {
    fn report(&mut self, err: &CompileError) {
        self.reported = true;
        self.inner.report(err);
    }
}
