use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use impc::codegen::codegen;
use impc::ir::generate;
use impc::lexer::tokenize;
use impc::optimizer::constant_folding::constant_folding;
use impc::optimizer::copy_propagation::copy_propagation;
use impc::parser::recursive_descent::Parser;
use impc::semantics::checker::check;

fn main() {
    let opts = Opt::from_args();
    if let Err(e) = run(&opts) {
        eprintln!("impc: {}", e);
        std::process::exit(1);
    }
}

fn run(opts: &Opt) -> Result<()> {
    let src = std::fs::read_to_string(&opts.path)?;

    let (tokens, lexical_errors) = tokenize(&src);
    for error in &lexical_errors {
        eprintln!("{}", error);
    }

    if opts.lex {
        for token in &tokens {
            println!("{:?}", token);
        }
        return Ok(());
    }

    let mut parser = Parser::new(tokens.into_iter().collect());
    let ast = parser.parse()?;

    if opts.parse {
        println!("{:#?}", ast);
        return Ok(());
    }

    let semantic_errors = check(&ast);
    for error in &semantic_errors {
        eprintln!("{}", error);
    }

    if opts.check {
        return Ok(());
    }

    let tac = generate(&ast);

    if opts.tacky {
        for instr in &tac {
            println!("{}", instr);
        }
        return Ok(());
    }

    let optimized = copy_propagation(&constant_folding(&tac));

    if opts.optimize {
        for instr in &optimized {
            println!("{}", instr);
        }
        return Ok(());
    }

    for instr in codegen(&optimized) {
        println!("{}", instr);
    }

    Ok(())
}

#[derive(Debug, StructOpt)]
struct Opt {
    path: PathBuf,

    #[structopt(name = "lex", long)]
    lex: bool,

    #[structopt(name = "parse", long)]
    parse: bool,

    #[structopt(name = "check", long)]
    check: bool,

    #[structopt(name = "tacky", long)]
    tacky: bool,

    #[structopt(name = "optimize", long)]
    optimize: bool,
}
