use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ktz::query::{Query, Session};
use ktz_solver::Variance;
use std::path::PathBuf;

/// Answer type-system queries against a class hierarchy.
#[derive(Debug, Parser)]
#[command(name = "ktz", version, about)]
struct Cli {
    /// JSON declaration file; only built-in classes are known without it.
    #[arg(long, short = 'd', global = true)]
    decls: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Explain why a subtype check fails.
    #[arg(long, global = true)]
    explain: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Position {
    Invariant,
    In,
    Out,
}

impl From<Position> for Variance {
    fn from(position: Position) -> Self {
        match position {
            Position::Invariant => Variance::Invariant,
            Position::In => Variance::In,
            Position::Out => Variance::Out,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Is SUB a subtype of SUP?
    Subtype { sub: String, sup: String },
    /// Are A and B subtypes of each other?
    Equal { a: String, b: String },
    /// Least common supertype of the given types.
    CommonSupertype {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Most specific type below all given types.
    Intersect {
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Replace type parameters inside TYPE.
    Substitute {
        #[arg(value_name = "TYPE")]
        ty: String,
        /// Binding written as `Class.Param=Type`; the type may start with
        /// `in` or `out`.
        #[arg(long = "with", value_parser = parse_binding)]
        bindings: Vec<(String, String)>,
        /// Variance of the position TYPE occupies.
        #[arg(long, value_enum, default_value_t = Position::Invariant)]
        position: Position,
    },
    /// Type of member NAME read from RECEIVER.
    Member { receiver: String, name: String },
}

fn parse_binding(text: &str) -> Result<(String, String), String> {
    let (parameter, ty) = text
        .split_once('=')
        .ok_or_else(|| format!("expected Class.Param=Type, got '{text}'"))?;
    Ok((parameter.trim().to_string(), ty.trim().to_string()))
}

impl From<Command> for Query {
    fn from(command: Command) -> Self {
        match command {
            Command::Subtype { sub, sup } => Query::Subtype { sub, sup },
            Command::Equal { a, b } => Query::Equal { a, b },
            Command::CommonSupertype { types } => Query::CommonSupertype { types },
            Command::Intersect { types } => Query::Intersect { types },
            Command::Substitute {
                ty,
                bindings,
                position,
            } => Query::Substitute {
                ty,
                bindings,
                position: position.into(),
            },
            Command::Member { receiver, name } => Query::Member { receiver, name },
        }
    }
}

fn main() -> Result<()> {
    // KTZ_LOG / KTZ_LOG_FORMAT, see src/tracing_config.rs.
    ktz::tracing_config::init_tracing();

    let cli = Cli::parse();
    let session = match &cli.decls {
        Some(path) => Session::load(path)?,
        None => Session::builtins_only(),
    };

    let answer = session.answer(&cli.command.into(), cli.explain)?;
    match cli.format {
        OutputFormat::Text => println!("{answer}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&answer).context("failed to serialize answer")?
        ),
    }
    Ok(())
}
