use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::Report;

use lc3vm::output::{warning, MsgColor, Output};
use lc3vm::{Image, Machine, MachineError, RunOptions, DEFAULT_START};

/// Emulator for the LC3 instructional computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide object images to run
    images: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Load binary object images and run them, starting at the origin of the first
    Run {
        /// Object images, loaded in order into the same memory
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Report every instruction before it executes
        #[arg(short, long)]
        trace: bool,
        /// Stop on reserved opcodes (`RTI`, `RES`) instead of skipping them
        #[arg(short, long)]
        strict: bool,
    },
    /// Load binary object images without running, and summarise them
    Check {
        /// Object images to check
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    lc3vm::env::init();

    let minimal = match &args.command {
        Some(Command::Run { minimal, .. }) => *minimal || lc3vm::env::is_minimal(),
        _ => lc3vm::env::is_minimal(),
    };
    Output::set_minimal(minimal);
    // Hook may only be installed once; a failure leaves the default handler in place
    let _ = miette::set_hook(Box::new(move |_| {
        Box::new(miette::MietteHandlerOpts::new().color(!minimal).build())
    }));

    let result = match args.command {
        Some(Command::Run {
            images,
            trace,
            strict,
            ..
        }) => {
            let opts = RunOptions {
                strict: strict || lc3vm::env::is_strict(),
                trace: trace || lc3vm::env::is_trace(),
            };
            run(&images, opts)
        }
        Some(Command::Check { images }) => check(&images),
        None if args.images.is_empty() => {
            if !minimal {
                println!("\n~ lc3vm v{VERSION} ~");
                println!("{}", SHORT_INFO.trim_end().cyan());
            }
            Err(MachineError::NoImage)
        }
        None => {
            let opts = RunOptions {
                strict: lc3vm::env::is_strict(),
                trace: lc3vm::env::is_trace(),
            };
            run(&args.images, opts)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let code = error.exit_code();
            eprintln!("{:?}", Report::new(error));
            ExitCode::from(code as u8)
        }
    }
}

fn run(images: &[PathBuf], opts: RunOptions) -> Result<(), MachineError> {
    let status = Output::Status;
    let mut machine = Machine::stdio(opts);

    let mut start = None;
    for path in images {
        status.file_message(MsgColor::Green, "Loading", path);
        let image = Image::open(path)?;
        warn_overflow(path, &image);
        machine.load(&image);
        // First image decides where execution starts
        if start.is_none() {
            start = Some(image.origin().unwrap_or(DEFAULT_START));
        }
    }
    machine.set_pc(start.unwrap_or(DEFAULT_START));

    status.message(
        MsgColor::Green,
        "Running",
        format!("from 0x{:04x}", machine.pc()),
    );
    machine.run()?;

    status.message(
        MsgColor::Green,
        "Completed",
        format!("{} instructions", machine.instruction_count()),
    );
    Ok(())
}

fn check(images: &[PathBuf]) -> Result<(), MachineError> {
    let status = Output::Status;
    for path in images {
        status.file_message(MsgColor::Green, "Checking", path);
        let image = Image::open(path)?;
        match image.origin() {
            Some(origin) => {
                let end = origin as usize + image.len();
                status.message(
                    MsgColor::Green,
                    "Origin",
                    format!("0x{origin:04x}, {} words up to 0x{end:05x}", image.len()),
                );
                warn_overflow(path, &image);
            }
            None => status.message(MsgColor::Cyan, "Empty", "no origin word, nothing to load"),
        }
    }
    status.message(MsgColor::Green, "Success", "all images can be loaded");
    Ok(())
}

fn warn_overflow(path: &Path, image: &Image) {
    let overflow = image.overflow();
    if overflow > 0 {
        warning(format_args!(
            "{} does not fit in memory, last {overflow} words are dropped",
            path.display()
        ));
    }
}

const SHORT_INFO: &str = r"
Runs binary object images for the LC3: big-endian words, the first being the load origin.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
