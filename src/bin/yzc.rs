use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{value_parser, ArgAction, Parser};
use eyre::WrapErr;
use log::{debug, error, info, LevelFilter};
use yz::{
    codegen::{self, CodeGen},
    lexer, parser,
    source::{self, SourceFile},
    util::fmt::tree,
};

/// Compiles yz sources.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Source roots to search for `.yz` files.
    #[arg(required = true)]
    roots: Vec<PathBuf>,
    /// Print the tokens of each file.
    #[arg(long)]
    tokens: bool,
    /// Print the parsed tree of each file.
    #[arg(long)]
    tree: bool,
    /// Write the generated Go stub of each file into this directory.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
    #[arg(short = 'v', value_parser = value_parser!(u8).range(0..=2), action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
    #[arg(short = 'q', value_parser = value_parser!(u8).range(0..=2), action = ArgAction::Count, conflicts_with = "verbose")]
    quiet: u8,
}

impl Args {
    /// Level selected by `-v[v]` or `-q[q]`.
    fn log_level_filter(&self) -> LevelFilter {
        match i16::from(self.verbose) - i16::from(self.quiet) {
            ..=-2 => LevelFilter::Off,
            -1 => LevelFilter::Error,
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            2.. => LevelFilter::Trace,
        }
    }
}

fn main() -> eyre::Result<ExitCode> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level_filter())
        .parse_default_env()
        .init();
    debug!("starting yzc with args: {args:?}");

    if let Some(out_dir) = &args.out_dir {
        fs::create_dir_all(out_dir)
            .wrap_err_with(|| format!("failed to create {}", out_dir.display()))?;
    }

    let files = source::collect(&args.roots)?;
    info!("found {} source files", files.len());

    let mut failed = 0_usize;
    for file in &files {
        if let Err(e) = compile(&args, file) {
            error!("{}: {e:#}", file.relative.display());
            failed += 1;
        }
    }

    if failed > 0 {
        error!("{failed} of {} files failed", files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Runs one file through the pipeline. Each file is independent, so a
/// failure here does not stop the others.
fn compile(args: &Args, file: &SourceFile) -> eyre::Result<()> {
    info!("processing {}", file.relative.display());
    let src = fs::read_to_string(&file.path)
        .wrap_err_with(|| format!("failed to read {}", file.path.display()))?;

    let tokens = lexer::scan_in_new(&src).map_err(|(tokens, e)| {
        if args.tokens {
            print_tokens(&tokens);
        }
        e
    })?;
    if args.tokens {
        print_tokens(&tokens);
    }

    let boc = parser::parse(&file.path_segments(), &tokens)?;
    if args.tree {
        print!("{}", tree::print_boc_string(&boc));
    }

    if let Some(out_dir) = &args.out_dir {
        let name = file.unit_name();
        let code = CodeGen::with_capacity().gen(&name, &boc);
        write_unit(out_dir, &codegen::file_name(&name), &code)?;
    }
    Ok(())
}

fn print_tokens(tokens: &[yz::token::Token]) {
    for token in tokens {
        println!("{token:?}");
    }
}

fn write_unit(out_dir: &Path, file_name: &str, code: &str) -> eyre::Result<()> {
    let path = out_dir.join(file_name);
    fs::write(&path, code).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    debug!("wrote {}", path.display());
    Ok(())
}
