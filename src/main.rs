use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use treelox::interpreter::Interpreter;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to execute; opens an interactive prompt when omitted
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(log::Level::Warn)?;

    let args: Cli = Cli::parse();

    match args.script {
        Some(path) => {
            let mut buf: Vec<u8> = Vec::new();
            let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
            reader.read_to_end(&mut buf)?;

            let source: String = String::from_utf8(buf)?;

            let exit_code: i32 = treelox::interpret(&source);
            if exit_code != 0 {
                process::exit(exit_code);
            }
        }

        None => run_prompt()?,
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }

        treelox::interpret_line(&line, &mut interpreter);
    }
}
