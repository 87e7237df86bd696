use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use dialoguer::Confirm;
use indoc::indoc;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use gadget_spec::{GadgetSpec, GadgetSpecError, GadgetSpecParser, ParserSettings};

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum GadgetOutputFormat {
    Json,
    JsonLines,
    Summary,
}

struct GadgetDump {
    parser: GadgetSpecParser,
    inputs: Vec<String>,
    output_format: GadgetOutputFormat,
    output: Box<dyn Write>,
    num_threads: usize,
    verbosity_level: Option<LevelFilter>,
}

/// Outcome of reading and parsing a single input.
enum Parsed {
    Spec(Box<GadgetSpec>),
    Invalid(GadgetSpecError),
    Unreadable(anyhow::Error),
}

impl GadgetDump {
    fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let inputs: Vec<String> = matches
            .get_many::<String>("INPUT")
            .context("at least one input is required")?
            .cloned()
            .collect();

        let output_format = match matches
            .get_one::<String>("output-format")
            .map(String::as_str)
            .unwrap_or("json")
        {
            "jsonl" => GadgetOutputFormat::JsonLines,
            "summary" => GadgetOutputFormat::Summary,
            _ => GadgetOutputFormat::Json,
        };

        let max_size = match matches.get_one::<usize>("max-size").copied() {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => Some(gadget_spec::DEFAULT_MAX_DOCUMENT_SIZE),
        };

        let max_depth = matches
            .get_one::<usize>("max-depth")
            .copied()
            .unwrap_or(gadget_spec::DEFAULT_MAX_DEPTH);

        let settings = ParserSettings::new()
            .max_document_size(max_size)
            .max_depth(max_depth)
            .reject_doctype(matches.get_flag("reject-doctype"));

        let num_threads = matches.get_one::<usize>("num-threads").copied().unwrap_or(0);
        let num_threads = match (cfg!(feature = "multithreading"), num_threads) {
            (true, number) => number,
            (false, 0) | (false, 1) => 1,
            (false, _) => {
                eprintln!(
                    "turned on threads, but library was compiled without `multithreading` feature! using fallback sync iterator"
                );
                1
            }
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            3 => Some(LevelFilter::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(LevelFilter::Trace)
            }
        };

        let output: Box<dyn Write> = match matches.get_one::<String>("output-target") {
            Some(path) => Box::new(
                Self::create_output_file(path, !matches.get_flag("no-confirm-overwrite"))
                    .with_context(|| format!("An error occurred while creating output file at `{path}`"))?,
            ),
            None => Box::new(io::stdout()),
        };

        Ok(GadgetDump {
            parser: GadgetSpecParser::new().with_configuration(settings),
            inputs,
            output_format,
            output,
            num_threads,
            verbosity_level,
        })
    }

    /// Main entry point for `GadgetDump`. Returns whether every input parsed.
    fn run(&mut self) -> Result<bool> {
        self.try_to_initialize_logging();

        let results = self.parse_all()?;
        let inputs = self.inputs.clone();
        let mut all_ok = true;

        for (input, parsed) in inputs.iter().zip(results) {
            match parsed {
                Parsed::Spec(spec) => self.dump_spec(input, &spec)?,
                Parsed::Invalid(e) => {
                    all_ok = false;
                    eprintln!("Failed to parse gadget `{input}`:");
                    for message in e.messages() {
                        eprintln!("\t{message}");
                    }
                }
                Parsed::Unreadable(e) => {
                    all_ok = false;
                    eprintln!("{e:?}");
                }
            }
        }

        self.output.flush()?;
        Ok(all_ok)
    }

    #[cfg(feature = "multithreading")]
    fn parse_all(&self) -> Result<Vec<Parsed>> {
        use rayon::prelude::*;

        let parser = &self.parser;
        let inputs = &self.inputs;

        // Standard input can only be consumed once, and in order.
        if self.num_threads == 1 || inputs.iter().any(|i| i == "-") {
            return Ok(inputs.iter().map(|i| parse_one(parser, i)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .context("Failed to build thread pool")?;

        log::info!("parsing {} inputs on {} threads", inputs.len(), pool.current_num_threads());
        Ok(pool.install(|| inputs.par_iter().map(|i| parse_one(parser, i)).collect()))
    }

    #[cfg(not(feature = "multithreading"))]
    fn parse_all(&self) -> Result<Vec<Parsed>> {
        Ok(self.inputs.iter().map(|i| parse_one(&self.parser, i)).collect())
    }

    fn dump_spec(&mut self, input: &str, spec: &GadgetSpec) -> Result<()> {
        match self.output_format {
            GadgetOutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.output, spec)?;
                writeln!(self.output)?;
            }
            GadgetOutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.output, spec)?;
                writeln!(self.output)?;
            }
            GadgetOutputFormat::Summary => {
                writeln!(self.output, "{input}")?;
                writeln!(self.output, "  checksum: {}", spec.checksum())?;
                writeln!(self.output, "  title: {}", spec.title())?;
                writeln!(
                    self.output,
                    "  views: {}",
                    spec.views().names().collect::<Vec<_>>().join(", ")
                )?;
                writeln!(self.output, "  required features: {}", spec.required_features().join(", "))?;
                writeln!(self.output, "  optional features: {}", spec.optional_features().join(", "))?;
                writeln!(self.output, "  user prefs: {}", spec.user_prefs().len())?;
                writeln!(self.output, "  links: {}", spec.links().len())?;
                writeln!(self.output, "  locales: {}", spec.locales().len())?;
            }
        }
        Ok(())
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!("There is a directory at {}, refusing to overwrite", p.display());
        }

        if p.exists() && prompt {
            let overwrite = Confirm::new()
                .with_prompt(format!("Are you sure you want to override output file at {}", p.display()))
                .default(false)
                .interact()?;

            if !overwrite {
                bail!("Cancelled");
            }
        }

        // Create parent directories if needed.
        if let Some(parent) = p.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Ok(File::create(p)?)
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {e}");
            }
        }
    }
}

fn parse_one(parser: &GadgetSpecParser, input: &str) -> Parsed {
    match read_input(input) {
        Ok(bytes) => match parser.parse(&bytes) {
            Ok(spec) => Parsed::Spec(Box::new(spec)),
            Err(e) => Parsed::Invalid(e),
        },
        Err(e) => Parsed::Unreadable(e),
    }
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read gadget from stdin")?;
        return Ok(buf);
    }

    let path = PathBuf::from(input);
    fs::read(&path).with_context(|| format!("Failed to open file {}", path.display()))
}

fn command() -> Command {
    Command::new("gadget_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to parse and validate gadget definition documents")
        .long_about(indoc!(r#"
            Utility to parse and validate gadget definition documents.

            Every input is parsed independently. Valid gadgets are printed in the selected
            format; invalid ones report all of their diagnostics on stderr and make the
            process exit with status 1.
        "#))
        .arg(
            Arg::new("INPUT")
                .required(true)
                .num_args(1..)
                .help("Gadget XML files to parse, `-` reads from stdin."),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["json", "jsonl", "summary"])
                .default_value("json")
                .help("Sets the output format"),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_name("FILE")
                .help(indoc!("Writes output to the file specified instead of stdout, errors will still be printed to stderr.
                       Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`
                       Will create parent directories if needed.")),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("max-size")
                .long("max-size")
                .value_name("BYTES")
                .value_parser(value_parser!(usize))
                .help("Rejects documents larger than this many bytes (0 disables the limit, default 1MiB)"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Rejects documents nesting elements deeper than this (default 256)"),
        )
        .arg(
            Arg::new("reject-doctype")
                .long("reject-doctype")
                .action(ArgAction::SetTrue)
                .help("Treats any DOCTYPE declaration as a syntax error"),
        )
        .arg(
            Arg::new("num-threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(usize))
                .help("Sets the number of worker threads, defaults to number of CPU cores."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help(indoc!(r#"
                Sets debug prints level for the application:
                    -v   - info
                    -vv  - debug
                    -vvv - trace
                NOTE: trace output is only available in debug builds, as it is extremely verbose."#)),
        )
}

fn main() {
    let matches = command().get_matches();

    let mut app = match GadgetDump::from_cli_matches(&matches) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{e:?}");
            exit(1)
        }
    };

    match app.run() {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("{e:?}");
            exit(1)
        }
    }
}
