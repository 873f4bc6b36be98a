use std::io::{self, BufRead, Write};

/// Ask whether to take every listed file.
///
/// Answers `1` (download all) or anything else (skip). End of input counts
/// as skip so unattended runs never block.
///
/// ```
/// use firmfetch_harvest::prompt::ask_take_all;
///
/// let mut out = Vec::new();
/// assert!(ask_take_all(&mut "1\n".as_bytes(), &mut out).unwrap());
/// assert!(!ask_take_all(&mut "2\n".as_bytes(), &mut out).unwrap());
/// ```
pub fn ask_take_all(input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<bool> {
    writeln!(out, "\nNo matching packages found. Options:")?;
    writeln!(out, "1. Download all files anyway")?;
    writeln!(out, "2. Skip this OS")?;
    write!(out, "Choose (1/2): ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }
    Ok(line.trim() == "1")
}
