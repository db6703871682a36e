//! Interactive terminal prompts

use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::firmware::{pick_exact, FirmwareImage};
use crate::log_debug;

const MODULE: &str = "prompt";

fn read_line<I: BufRead>(input: &mut I) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| Error::Configuration(format!("failed to read from stdin: {}", e)))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn flush<O: Write>(output: &mut O) -> Result<()> {
    output
        .flush()
        .map_err(|e| Error::Configuration(format!("failed to write to stdout: {}", e)))
}

/// List the candidates and keep asking until the user types one exact filename
pub fn choose_image<I: BufRead, O: Write>(
    candidates: &[FirmwareImage],
    input: &mut I,
    output: &mut O,
) -> Result<FirmwareImage> {
    if candidates.is_empty() {
        return Err(Error::not_found("no firmware images to choose from"));
    }

    let _ = writeln!(output, "\nAvailable firmware images:");
    for (i, image) in candidates.iter().enumerate() {
        let _ = writeln!(output, "  {:>3}. {}", i + 1, image.filename);
    }

    loop {
        let _ = write!(output, "\nType the exact filename to flash: ");
        flush(output)?;

        let Some(answer) = read_line(input)? else {
            return Err(Error::Configuration(
                "no firmware image selected (input closed)".to_string(),
            ));
        };

        if answer.is_empty() {
            continue;
        }

        match pick_exact(candidates, &answer) {
            Some(image) => {
                log_debug!(MODULE, "User picked {}", image.filename);
                return Ok(image.clone());
            }
            None => {
                let _ = writeln!(output, "'{}' is not one of the listed filenames.", answer);
            }
        }
    }
}

/// Ask the user to put the device in download mode and wait for Enter
pub fn confirm_ready<I: BufRead, O: Write>(input: &mut I, output: &mut O) -> Result<()> {
    let _ = writeln!(
        output,
        "\nACTION REQUIRED: Put your device in BOOT/Download mode if needed, then press Enter to continue..."
    );
    flush(output)?;

    match read_line(input)? {
        Some(_) => Ok(()),
        None => Err(Error::Configuration(
            "flashing not confirmed (input closed)".to_string(),
        )),
    }
}
