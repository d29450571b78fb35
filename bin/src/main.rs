use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;

use interpreter::{InterpretError, Interpreter, Mode};

#[derive(clap::Parser)]
struct Args {
    /// Script to run. Starts an interactive prompt if omitted.
    file: Option<PathBuf>,
}

// Exit codes from sysexits.h
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;

fn report(error: &InterpretError) {
    match error {
        InterpretError::SyntaxErrors(e) => eprintln!("{e}"),
        InterpretError::RuntimeError(e) => eprintln!("{e}\n[line {}]", e.line),
    }
}

fn run_file(path: PathBuf, interpreter: &mut Interpreter) -> anyhow::Result<ExitCode> {
    log::debug!("Running {}", path.display());
    let source = std::fs::read_to_string(path)?;
    let result = interpreter.run_source(&source, Mode::File, &mut stdout());
    if let Err(e) = &result {
        report(e);
    }

    Ok(match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(InterpretError::SyntaxErrors(_)) => ExitCode::from(EX_DATAERR),
        Err(InterpretError::RuntimeError(_)) => ExitCode::from(EX_SOFTWARE),
    })
}

fn run_prompt(interpreter: &mut Interpreter) -> anyhow::Result<ExitCode> {
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            println!();
            return Ok(ExitCode::SUCCESS);
        }

        let line = line.trim_end_matches(['\n', '\r']);
        log::trace!("Input: {line:?}");
        match interpreter.run_source(line, Mode::Repl, &mut stdout()) {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => (),
            Err(e) => report(&e),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let mut interpreter = Interpreter::new();

    match args.file {
        Some(file) => run_file(file, &mut interpreter),
        None => run_prompt(&mut interpreter),
    }
}
