pub mod codegen;
pub mod ir;
pub mod lexer;
pub mod parser {
    pub mod ast;
    pub mod recursive_descent;
}
pub mod semantics {
    pub mod checker;
}
pub mod optimizer {
    pub mod constant_folding;
    pub mod copy_propagation;
}

use anyhow::Result;

/// Every stage output of one run, in pipeline order. Display layers
/// consume these sequences; the core never renders anything itself.
#[derive(Debug)]
pub struct Compilation {
    pub tokens: Vec<lexer::Token>,
    pub lexical_errors: Vec<lexer::LexicalError>,
    pub ast: parser::ast::Program,
    pub semantic_errors: Vec<semantics::checker::SemanticError>,
    pub ir: Vec<ir::IRInstruction>,
    pub optimized: Vec<ir::IRInstruction>,
    pub asm: Vec<codegen::AsmInstruction>,
}

/// Runs the whole pipeline over one source string. A syntax error is the
/// only terminal failure; lexical and semantic diagnostics are carried in
/// the result and never stop compilation.
pub fn compile(src: &str) -> Result<Compilation> {
    let (tokens, lexical_errors) = lexer::tokenize(src);

    let mut parser =
        parser::recursive_descent::Parser::new(tokens.iter().cloned().collect());
    let ast = parser.parse()?;

    let semantic_errors = semantics::checker::check(&ast);

    let ir = ir::generate(&ast);
    let folded = optimizer::constant_folding::constant_folding(&ir);
    let optimized = optimizer::copy_propagation::copy_propagation(&folded);
    let asm = codegen::codegen(&optimized);

    Ok(Compilation {
        tokens,
        lexical_errors,
        ast,
        semantic_errors,
        ir,
        optimized,
        asm,
    })
}
