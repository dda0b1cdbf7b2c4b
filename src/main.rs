use std::fs;
use std::path::{Path, PathBuf};

use bootvm::{BootOutcome, Console, Machine, MachineConfig, StdoutConsole};
use clap::{ArgAction, Parser};
use color_eyre::eyre::{Result, WrapErr};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

/// Boots a 512-byte image and runs it until it halts
#[derive(Parser, Debug)]
#[command(name = "bootvm", version, about)]
struct Args {
    /// Boot image, loaded at 0x7C00
    image: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Reads the image at `path` into a fresh machine and boots it
fn boot<C: Console>(path: &Path, console: &mut C) -> Result<BootOutcome> {
    let image = fs::read(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;

    let mut machine = Machine::new(MachineConfig::default());
    machine
        .load_image(&image)
        .wrap_err_with(|| format!("failed to load {}", path.display()))?;

    Ok(machine.run(console)?)
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    let args = Args::parse();
    SimpleLogger::new()
        .with_level(log_level(args.verbose))
        .init()
        .wrap_err("failed to set up logging")?;

    let outcome = boot(&args.image, &mut StdoutConsole)?;
    info!("boot finished: {:?}", outcome);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootvm::{Halt, MachineError, MemoryError};
    use clap::error::ErrorKind;

    fn temp_image(name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = std::env::temp_dir().join(format!("bootvm-{}-{}.bin", std::process::id(), name));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    #[test]
    fn test_missing_image_argument() -> Result<()> {
        let err = Args::try_parse_from(["bootvm"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);

        Ok(())
    }

    #[test]
    fn test_verbosity() -> Result<()> {
        let args = Args::try_parse_from(["bootvm", "-vv", "boot.bin"])?;
        assert_eq!(args.image, PathBuf::from("boot.bin"));
        assert_eq!(log_level(args.verbose), LevelFilter::Debug);
        assert_eq!(log_level(0), LevelFilter::Warn);
        assert_eq!(log_level(7), LevelFilter::Trace);

        Ok(())
    }

    #[test]
    fn test_boot_file() -> Result<()> {
        let mut image = vec![0; 512];
        image[0] = 0xEB;
        image[1] = 0xFE;
        image[0x1FE] = 0x55;
        image[0x1FF] = 0xAA;
        let path = temp_image("signed", &image)?;

        let mut console: Vec<String> = Vec::new();
        let outcome = boot(&path, &mut console);
        fs::remove_file(&path)?;

        assert_eq!(outcome?, BootOutcome::Halted(Halt::SelfLoop));
        assert_eq!(console.len(), 3);

        Ok(())
    }

    #[test]
    fn test_oversized_file_aborts_setup() -> Result<()> {
        let path = temp_image("oversized", &[0; 600])?;

        let mut console: Vec<String> = Vec::new();
        let result = boot(&path, &mut console);
        fs::remove_file(&path)?;

        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<MachineError>(),
            Some(&MachineError::Memory(MemoryError::ImageTooLarge {
                len: 600,
                max: 512
            }))
        );
        assert!(console.is_empty());

        Ok(())
    }

    #[test]
    fn test_unreadable_file() -> Result<()> {
        let path = std::env::temp_dir().join("bootvm-does-not-exist.bin");

        let mut console: Vec<String> = Vec::new();
        let err = boot(&path, &mut console).unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());

        Ok(())
    }
}
