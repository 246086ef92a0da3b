use crate::engine::eval::DEFAULT_MAX_DEPTH;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A small Lisp interpreter with separate variable, function and macro namespaces.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(name = "cisl", bin_name = "cisl")]
#[clap(subcommand_required = true, arg_required_else_help = true)] // Ensures a subcommand is given, or help is printed.
pub struct Cli {
    /// Maximum nesting depth of evaluation before a program is aborted.
    #[clap(
        long,
        global = true,
        value_name = "N",
        env = "CISL_MAX_DEPTH",
        default_value_t = DEFAULT_MAX_DEPTH
    )]
    pub max_depth: usize,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluates a Lisp expression from a string or executes a Lisp file.
    Run(RunArgs),
    /// Starts an interactive session.
    Repl,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Lisp expression string to evaluate.
    #[clap(short, long, value_name = "LISP_CODE", conflicts_with = "file")]
    pub expr: Option<String>,

    /// Path to a Lisp file to execute.
    #[clap(value_name = "FILE_PATH", conflicts_with = "expr", required_unless_present = "expr")]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_with_expression() {
        let cli = Cli::try_parse_from(["cisl", "run", "--expr", "(+ 1 2)"]).unwrap();
        assert_eq!(cli.max_depth, DEFAULT_MAX_DEPTH);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.expr.as_deref(), Some("(+ 1 2)"));
                assert!(args.file.is_none());
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn max_depth_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["cisl", "run", "prog.lisp", "--max-depth", "64"]).unwrap();
        assert_eq!(cli.max_depth, 64);
    }

    #[test]
    fn expression_and_file_conflict() {
        assert!(Cli::try_parse_from(["cisl", "run", "--expr", "1", "prog.lisp"]).is_err());
        assert!(Cli::try_parse_from(["cisl", "run"]).is_err());
    }
}
