//! CLI entry point for the VonSim8 runner binary.

use std::env;
use std::ffi::OsString;
use std::time::Instant;

use devs_kernel::{TransitionEvent, TransitionKind};
use vonsim_core::{RegisterId, RunReport, SystemConfig, VonSim8, REGISTER_COUNT};

const USAGE_TEXT: &str = "\
Usage: vonsim8 <command> [options]

Commands:
  run    Load the machine and execute one instruction to quiescence

Options:
  --poke <ADDR=BYTE>   Store BYTE at ADDR before the run (repeatable)
  --reg <NAME=BYTE>    Seed register AL, BL, CL or DL (repeatable)
  --max-steps <N>      Coordinator step budget (default: 1000)
  --trace              Print every component transition
  --json               Print the run report as JSON
  -v, --verbose        Log at debug level (RUST_LOG overrides)
  -h, --help           Show this help message

Numbers accept decimal or 0x-prefixed hex.

Examples:
  vonsim8 run
  vonsim8 run --reg BL=0x7F --trace
  vonsim8 run --poke 0=0x02 --json
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunArgs {
    pokes: Vec<(u8, u8)>,
    registers: Vec<(RegisterId, u8)>,
    max_steps: Option<u64>,
    trace: bool,
    json: bool,
    verbose: bool,
}

impl RunArgs {
    fn config(&self) -> SystemConfig {
        let mut config = SystemConfig::default();
        for &(address, byte) in &self.pokes {
            config.poke(address, byte);
        }
        for &(id, value) in &self.registers {
            config.registers[id.index()] = value;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        config
    }
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut parsed = RunArgs::default();

    while let Some(arg) = args.next() {
        let arg = arg.to_string_lossy().to_string();
        match arg.as_str() {
            "--help" | "-h" => return Err(USAGE_TEXT.to_string()),
            "--trace" => parsed.trace = true,
            "--json" => parsed.json = true,
            "--verbose" | "-v" => parsed.verbose = true,
            "--poke" => {
                let value = option_value(&mut args, "--poke")?;
                let (address, byte) = split_assignment(&value)?;
                parsed.pokes.push((parse_byte(address)?, parse_byte(byte)?));
            }
            "--reg" => {
                let value = option_value(&mut args, "--reg")?;
                let (name, byte) = split_assignment(&value)?;
                let id = RegisterId::from_name(name)
                    .ok_or_else(|| format!("unknown register: {name}"))?;
                parsed.registers.push((id, parse_byte(byte)?));
            }
            "--max-steps" => {
                let value = option_value(&mut args, "--max-steps")?;
                let steps = parse_number(&value)?;
                if steps == 0 {
                    return Err("--max-steps must be positive".to_string());
                }
                parsed.max_steps = Some(steps);
            }
            other => return Err(format!("unknown option: {other}")),
        }
    }

    Ok(parsed)
}

fn option_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn split_assignment(value: &str) -> Result<(&str, &str), String> {
    value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{value}`"))
}

fn parse_number(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| format!("invalid number: {text}"))
}

fn parse_byte(text: &str) -> Result<u8, String> {
    let value = parse_number(text)?;
    u8::try_from(value).map_err(|_| format!("value out of byte range: {text}"))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

const fn kind_label(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Internal => "internal",
        TransitionKind::External => "external",
        TransitionKind::Confluent => "confluent",
    }
}

fn run_machine(args: &RunArgs) -> Result<(), i32> {
    init_logging(args.verbose);

    let config = args.config();
    let initial = config.registers;
    let initial_ip = config.ip;
    log::debug!("starting from {config:?}");

    let mut system = match VonSim8::new(config) {
        Ok(system) => system,
        Err(e) => {
            eprintln!("error: {e}");
            return Err(1);
        }
    };

    if args.trace {
        system.set_observer(|event: &TransitionEvent<'_>| {
            println!(
                "t={:>4}  {:<4} {}",
                event.time,
                event.component,
                kind_label(event.kind)
            );
        });
    }

    let started = Instant::now();
    let report = match system.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return Err(1);
        }
    };
    let elapsed = started.elapsed();

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to encode report: {e}");
                return Err(1);
            }
        }
        return Ok(());
    }

    print_report(&report, initial, initial_ip);
    println!("Wall time: {:.3} ms", elapsed.as_secs_f64() * 1_000.0);
    Ok(())
}

fn print_report(report: &RunReport, initial: [u8; REGISTER_COUNT], initial_ip: u8) {
    let snapshot = &report.snapshot;
    let summary = &report.summary;

    match &snapshot.decoded {
        Some(decoded) => println!("Instruction: {decoded}"),
        None => println!("Instruction: <not decoded>"),
    }
    println!("Phase: {} at t={}", snapshot.phase, snapshot.clock);

    println!("Registers:");
    for id in RegisterId::ALL {
        let before = initial[id.index()];
        let after = snapshot.register(id);
        if before == after {
            println!("  {id}  {after:02X}");
        } else {
            println!("  {id}  {before:02X} -> {after:02X}");
        }
    }
    if initial_ip == snapshot.ip {
        println!("  IP  {:02X}", snapshot.ip);
    } else {
        println!("  IP  {initial_ip:02X} -> {:02X}", snapshot.ip);
    }
    println!(
        "  MAR {:02X}  MBR {:02X}  IR {:02X}",
        snapshot.mar, snapshot.mbr, snapshot.ir
    );

    let cycles = snapshot.cycles;
    match cycles.cpi() {
        Some(cpi) => println!(
            "Cycles: {} (fetch {}, execute {}), CPI {cpi:.2}",
            cycles.total, cycles.fetch, cycles.execute
        ),
        None => println!(
            "Cycles: {} (fetch {}, execute {})",
            cycles.total, cycles.fetch, cycles.execute
        ),
    }
    println!(
        "Kernel: {} steps, {} internal, {} external, {} confluent",
        summary.steps, summary.internal, summary.external, summary.confluent
    );
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Run(args))) => match run_machine(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(items: &[&str]) -> impl Iterator<Item = OsString> {
        items
            .iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_run_with_every_option() {
        let result = parse_run_args(args(&[
            "--poke",
            "0x10=0xFF",
            "--reg",
            "bl=7",
            "--max-steps",
            "50",
            "--trace",
            "--json",
            "-v",
        ]))
        .expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                pokes: vec![(0x10, 0xFF)],
                registers: vec![(RegisterId::BL, 7)],
                max_steps: Some(50),
                trace: true,
                json: true,
                verbose: true,
            }
        );
    }

    #[test]
    fn bare_run_uses_the_canonical_config() {
        let result = parse_run_args(std::iter::empty()).expect("no options is valid");
        assert_eq!(result.config(), SystemConfig::default());
    }

    #[test]
    fn options_shape_the_config() {
        let result = parse_run_args(args(&[
            "--poke", "0=2", "--reg", "DL=0x44", "--max-steps", "9",
        ]))
        .expect("valid run args should parse");
        let config = result.config();

        assert_eq!(config.memory, vec![(0x00, 0x02)]);
        assert_eq!(config.register(RegisterId::DL), 0x44);
        assert_eq!(config.max_steps, 9);
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(args(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(args(&["step"])).expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_unknown_register() {
        let error =
            parse_run_args(args(&["--reg", "XL=1"])).expect_err("XL is not a register");
        assert!(error.contains("unknown register"));
    }

    #[test]
    fn rejects_out_of_range_bytes() {
        let error =
            parse_run_args(args(&["--poke", "0=256"])).expect_err("256 does not fit a byte");
        assert!(error.contains("out of byte range"));
    }

    #[test]
    fn rejects_missing_assignment() {
        let error = parse_run_args(args(&["--poke", "12"])).expect_err("needs KEY=VALUE");
        assert!(error.contains("KEY=VALUE"));
    }

    #[test]
    fn rejects_missing_option_value() {
        let error = parse_run_args(args(&["--max-steps"])).expect_err("value required");
        assert!(error.contains("missing value for --max-steps"));
    }

    #[test]
    fn rejects_zero_step_budget() {
        let error = parse_run_args(args(&["--max-steps", "0"])).expect_err("zero budget");
        assert!(error.contains("positive"));
    }

    #[test]
    fn numbers_accept_hex_and_decimal() {
        assert_eq!(parse_number("0x1F"), Ok(31));
        assert_eq!(parse_number("0X1f"), Ok(31));
        assert_eq!(parse_number("31"), Ok(31));
        assert!(parse_number("0xZZ").is_err());
    }
}
