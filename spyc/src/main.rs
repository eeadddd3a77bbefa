use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use spyc::codegen::CodegenOptions;
use spyc::ir::printer;
use spyc::{CompileError, Compiler};

#[derive(Parser)]
#[command(name = "spyc", version)]
#[command(about = "Compile SPython source to basic-block IR")]
struct Args {
    /// Source file to compile; starts the REPL when omitted
    file: Option<PathBuf>,

    /// Write the IR here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the parsed tree before compiling
    #[arg(long)]
    emit_ast: bool,

    /// Only allow calls to functions defined earlier in the file
    #[arg(long)]
    no_predeclare: bool,

    /// Module name in the IR header (defaults to the file stem)
    #[arg(long)]
    module_name: Option<String>,

    /// Print the time spent in each stage to stderr
    #[arg(long)]
    time: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let options = CodegenOptions {
        predeclare_functions: !args.no_predeclare,
        ..CodegenOptions::default()
    };
    let compiler = Compiler::new().with_options(options);

    let Some(path) = args.file.as_deref() else {
        return spyc::repl::run(compiler).map_err(|err| format!("repl error: {}", err));
    };

    let source = fs::read_to_string(path)
        .map_err(|err| format!("failed to read '{}': {}", path.display(), err))?;
    let source_label = path.display().to_string();
    let module_name = args
        .module_name
        .clone()
        .unwrap_or_else(|| default_module_name(path));

    if args.emit_ast {
        let program = compiler
            .parse_source(&source)
            .map_err(|err| err.render(&source_label, &source))?;
        println!("{}", program);
    }

    let (module, timings) = compiler
        .compile_source_timed(&source, &module_name)
        .map_err(|err: CompileError| err.render(&source_label, &source))?;

    if args.time {
        eprintln!(
            "time: lex {:.3} ms, parse {:.3} ms, codegen {:.3} ms",
            timings.lex.as_secs_f64() * 1000.0,
            timings.parse.as_secs_f64() * 1000.0,
            timings.codegen.as_secs_f64() * 1000.0
        );
    }

    let text = printer::render(&module);
    match &args.output {
        Some(output) => fs::write(output, text)
            .map_err(|err| format!("failed to write '{}': {}", output.display(), err)),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn default_module_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("module")
        .to_string()
}
