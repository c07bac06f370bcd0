use crate::error::*;
use crate::expression::*;
use crate::mip_solver::*;
use crate::model::*;
use crate::util::*;
use clap::builder::{StringValueParser, TypedValueParser, ValueParser};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use prettytable::{Cell, Row, Table};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Clone)]
#[clap(author = clap::crate_authors!(", "))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(about = "Mixed-Integer Linear Programming Solver by Branch-and-Bound over LP Relaxations")]
#[clap(color = clap::ColorChoice::Auto)]
#[clap(propagate_version = true)]
#[clap(subcommand_required = true)]
#[clap(arg_required_else_help = true)]
pub struct Cli {
    /// logging verbosity on stderr: -v info, -vv debug, -vvv trace
    #[clap(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// solve one problem given on the command line or as a JSON file
    Solve(SolveParameters),
    /// built-in tests
    Test {
        #[clap(subcommand)]
        command: TestCommands,
    },
}

#[derive(Parser, Clone)]
pub struct SolveParameters {
    /// objective expression, e.g. "3x1 + 4x2"
    #[clap(value_parser, required_unless_present = "problem")]
    objective: Option<String>,
    /// optimization sense
    #[clap(short = 's', long, value_enum, default_value_t = Sense::Max)]
    sense: Sense,
    /// constraint like "x1 + 2x2 <= 14"; may be repeated
    #[clap(short = 'c', long = "constraint")]
    constraints: Vec<String>,
    /// variable restricted to integer values; may be repeated
    #[clap(short = 'i', long = "integer")]
    integers: Vec<String>,
    /// JSON problem file with `objective`, `sense`, `constraints` and `variables`
    #[clap(long, conflicts_with_all = ["objective", "constraints", "integers"])]
    problem: Option<String>,
    /// the configuration of the solver
    #[clap(long, default_value_t = json!({}), value_parser = ValueParser::new(SerdeJsonParser))]
    solver_config: serde_json::Value,
    /// print the solution as JSON instead of a table
    #[clap(long, action)]
    json: bool,
    /// print the branch-and-bound profiler report after the solution
    #[clap(long, action)]
    profile: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum TestCommands {
    /// test common cases
    Common,
}

#[derive(Clone)]
struct SerdeJsonParser;
impl TypedValueParser for SerdeJsonParser {
    type Value = serde_json::Value;
    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let inner = StringValueParser::new();
        let val = inner.parse_ref(cmd, arg, value)?;
        match serde_json::from_str::<serde_json::Value>(&val) {
            Ok(vector) => Ok(vector),
            Err(error) => {
                let mut err = clap::Error::new(ErrorKind::ValueValidation).with_cmd(cmd);
                if let Some(arg) = arg {
                    err.insert(ContextKind::InvalidArg, ContextValue::String(arg.to_string()));
                }
                err.insert(
                    ContextKind::InvalidValue,
                    ContextValue::String(format!("should be like {{\"max_nodes\":100}}, parse error: {error}")),
                );
                Err(err)
            }
        }
    }
}

impl Cli {
    pub fn run(self) {
        init_logging(self.verbose);
        match self.command {
            Commands::Solve(parameters) => parameters.run(),
            Commands::Test { command } => match command {
                TestCommands::Common => {
                    let mut failures = 0;
                    for (name, check) in common_scenarios() {
                        match check() {
                            Ok(true) => println!("[Common Test] {name} ... ok"),
                            Ok(false) => {
                                println!("[Common Test] {name} ... FAILED");
                                failures += 1;
                            }
                            Err(error) => {
                                println!("[Common Test] {name} ... FAILED: {error}");
                                failures += 1;
                            }
                        }
                    }
                    if failures > 0 {
                        eprintln!("{failures} common test(s) failed");
                        std::process::exit(1);
                    }
                }
            },
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {error}");
    }
}

impl SolveParameters {
    /// the problem described by the arguments, or read from `--problem`
    pub fn problem_input(&self) -> SolverResult<ProblemInput> {
        if let Some(path) = self.problem.as_ref() {
            return ProblemInput::from_json_file(path);
        }
        let objective = self.objective.clone().unwrap_or_default();
        let constraints = self
            .constraints
            .iter()
            .enumerate()
            .map(|(index, line)| ConstraintInput::parse_line(format!("{}", index + 1), line))
            .collect::<Result<Vec<_>, _>>()?;
        let variables = ModelBuilder::default().declarations_from_objective(&objective, &self.integers)?;
        Ok(ProblemInput {
            objective,
            sense: self.sense,
            constraints,
            variables,
        })
    }

    fn run(self) {
        let problem = match self.problem_input() {
            Ok(problem) => problem,
            Err(error) => {
                eprintln!("Error solving the problem: {error}");
                std::process::exit(1);
            }
        };
        let mut solver = match MipSolver::new(self.solver_config.clone()) {
            Ok(solver) => solver,
            Err(error) => {
                eprintln!("invalid solver configuration: {error}");
                std::process::exit(1);
            }
        };
        let solution = solver.solve_problem(&problem);
        if self.json {
            match serde_json::to_string_pretty(&solution) {
                Ok(text) => println!("{text}"),
                Err(error) => eprintln!("cannot serialize the solution: {error}"),
            }
        } else {
            println!("{}", solution_table(&solution));
        }
        if self.profile {
            println!("{}", solver.generate_profiler_report());
        }
        if solution.status == SolveStatus::Error {
            std::process::exit(1);
        }
    }
}

pub fn solution_table(solution: &Solution) -> Table {
    let mut table = Table::new();
    table.set_titles(Row::new(vec![Cell::new("variable"), Cell::new("value")]));
    for (name, value) in solution.values.iter() {
        table.add_row(Row::new(vec![Cell::new(name), Cell::new(&format!("{value}"))]));
    }
    let optional = |value: Option<usize>| value.map_or(String::from("-"), |value| format!("{value}"));
    let summary = [
        ("status", solution.status.to_string()),
        ("feasible", format!("{}", solution.feasible)),
        ("objective", format!("{}", solution.result)),
        ("bounded", solution.bounded.map_or(String::from("-"), |bounded| format!("{bounded}"))),
        ("iterations", optional(solution.iterations)),
        ("nodes", optional(solution.nodes)),
    ];
    for (key, value) in summary.iter() {
        table.add_row(Row::new(vec![Cell::new(key), Cell::new(value)]));
    }
    if let Some(error) = solution.error.as_ref() {
        table.add_row(Row::new(vec![Cell::new("error"), Cell::new(error)]));
    }
    table
}

type ScenarioCheck = fn() -> SolverResult<bool>;

/// the built-in scenarios of `test common`
pub fn common_scenarios() -> Vec<(&'static str, ScenarioCheck)> {
    vec![
        ("continuous linear program", scenario_continuous),
        ("integer program below its relaxation", scenario_integer),
        ("unbounded objective", scenario_unbounded),
        ("contradicting constraints", scenario_infeasible),
        ("repeated variable in one expression", scenario_repeated_variable),
    ]
}

fn scenario_constraints(capacity: &str) -> SolverResult<Vec<ConstraintInput>> {
    Ok([format!("x1 + 2x2 <= {capacity}"), "3x1 - x2 >= 0".to_string(), "x1 - x2 <= 2".to_string()]
        .iter()
        .enumerate()
        .map(|(index, line)| ConstraintInput::parse_line(format!("{}", index + 1), line))
        .collect::<Result<Vec<_>, _>>()?)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn scenario_continuous() -> SolverResult<bool> {
    let solution = solve("3x1 + 4x2", Sense::Max, &scenario_constraints("14")?, &[]);
    Ok(solution.feasible
        && close(solution.result, 34.)
        && close(solution.value("x1"), 6.)
        && close(solution.value("x2"), 4.))
}

fn scenario_integer() -> SolverResult<bool> {
    // the relaxation vertex (17/3, 11/3) is fractional
    let constraints = scenario_constraints("13")?;
    let variables = vec![VariableDeclaration::integer("x1"), VariableDeclaration::integer("x2")];
    let relaxation = solve("3x1 + 4x2", Sense::Max, &constraints, &[]);
    let solution = solve("3x1 + 4x2", Sense::Max, &constraints, &variables);
    let integral = variables
        .iter()
        .all(|variable| solution.value(&variable.name).fract() == 0.);
    tracing::info!(
        "integer optimum {} at {}",
        solution.result,
        solution.values.iter().map(|(name, value)| format!("{name}={value}")).join(", ")
    );
    Ok(solution.feasible
        && integral
        && close(solution.result, 31.)
        && solution.result < relaxation.result
        && solution.nodes.map_or(false, |nodes| nodes > 1))
}

fn scenario_unbounded() -> SolverResult<bool> {
    let constraints = vec![ConstraintInput::parse_line("1", "x1 >= 0")?];
    let solution = solve("x1", Sense::Max, &constraints, &[]);
    Ok(solution.feasible && solution.bounded == Some(false))
}

fn scenario_infeasible() -> SolverResult<bool> {
    let constraints = vec![
        ConstraintInput::parse_line("1", "x1 <= 1")?,
        ConstraintInput::parse_line("2", "x1 >= 2")?,
    ];
    let solution = solve("x1", Sense::Max, &constraints, &[]);
    Ok(!solution.feasible)
}

fn scenario_repeated_variable() -> SolverResult<bool> {
    let overwrite = parse_expression("x1 + x1")?;
    let sum = ExpressionParser::new(RepeatedTerms::Sum).parse("x1 + x1")?;
    Ok(overwrite.coefficient("x1") == Some(1.) && sum.coefficient("x1") == Some(2.))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn cli_common_scenarios_pass() {
        // cargo test cli_common_scenarios_pass -- --nocapture
        for (name, check) in common_scenarios() {
            assert!(check().unwrap(), "scenario {name} failed");
        }
    }

    #[test]
    fn cli_solve_arguments() {
        let cli = Cli::try_parse_from([
            "mipbb", "solve", "3x1 + 4x2", "-c", "x1 + 2x2 <= 14", "-c", "3x1 - x2 >= 0", "-i", "x1", "--json",
        ])
        .unwrap();
        let Commands::Solve(parameters) = cli.command else {
            panic!("expected the solve subcommand");
        };
        assert!(parameters.json);
        assert_eq!(parameters.sense, Sense::Max);
        let problem = parameters.problem_input().unwrap();
        assert_eq!(problem.constraints[1], ConstraintInput::new("2", "3x1 - x2", ">=", "0"));
        assert_eq!(
            problem.variables,
            vec![VariableDeclaration::integer("x1"), VariableDeclaration::continuous("x2")]
        );
    }

    #[test]
    fn cli_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["mipbb", "solve"]).is_err());
        assert!(Cli::try_parse_from(["mipbb", "solve", "x1", "--sense", "up"]).is_err());
        assert!(Cli::try_parse_from(["mipbb", "solve", "x1", "--sense", "maximum"]).is_err());
        assert!(Cli::try_parse_from(["mipbb", "solve", "x1", "--solver-config", "{"]).is_err());
        let cli = Cli::try_parse_from(["mipbb", "solve", "x1", "-c", "x1 + 4"]).unwrap();
        let Commands::Solve(parameters) = cli.command else {
            panic!("expected the solve subcommand");
        };
        assert!(matches!(
            parameters.problem_input(),
            Err(SolverError::Parse(ParseError::MalformedConstraint(_)))
        ));
    }

    #[test_case("max", Sense::Max)]
    #[test_case("maximize", Sense::Max)]
    #[test_case("maximise", Sense::Max)]
    #[test_case("min", Sense::Min)]
    #[test_case("minimize", Sense::Min)]
    #[test_case("minimise", Sense::Min)]
    fn cli_sense_spellings(text: &str, sense: Sense) {
        let cli = Cli::try_parse_from(["mipbb", "solve", "x1", "--sense", text]).unwrap();
        let Commands::Solve(parameters) = cli.command else {
            panic!("expected the solve subcommand");
        };
        assert_eq!(parameters.sense, sense);
        assert_eq!(text.parse::<Sense>().unwrap(), sense);
        assert_eq!(serde_json::from_value::<Sense>(serde_json::json!(text)).unwrap(), sense);
    }

    #[test]
    fn cli_solution_table() {
        let solution = solve("x1", Sense::Max, &[ConstraintInput::new("1", "x1", "<=", "3")], &[]);
        let text = solution_table(&solution).to_string();
        assert!(text.contains("optimal"));
        assert!(text.contains("x1"));
    }
}
