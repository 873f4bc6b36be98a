//! Console progress and the end-of-run summary.

use crate::plan::DownloadItem;
use crate::scan::Inventory;
use firmfetch_http::Progress;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

/// Files found and files downloaded for one OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub found: usize,
    /// Includes files that already existed on disk.
    pub downloaded: usize,
}

impl Tally {
    pub fn failed(&self) -> usize {
        self.found.saturating_sub(self.downloaded)
    }
}

/// Per-OS tallies in visiting order, for targets that yielded matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    entries: Vec<(String, Tally)>,
}

impl RunSummary {
    pub fn record(&mut self, os_name: &str, tally: Tally) {
        self.entries.push((os_name.to_string(), tally));
    }

    pub fn entries(&self) -> &[(String, Tally)] {
        &self.entries
    }

    pub fn total_found(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.found).sum()
    }

    pub fn total_downloaded(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.downloaded).sum()
    }

    pub fn failed(&self) -> usize {
        self.total_found().saturating_sub(self.total_downloaded())
    }

    pub fn os_with_files(&self) -> usize {
        self.entries.len()
    }

    /// The OS with the most files found; the earliest one wins a tie.
    ///
    /// ```
    /// use firmfetch_harvest::{RunSummary, Tally};
    ///
    /// let mut s = RunSummary::default();
    /// s.record("BIOS", Tally { found: 3, downloaded: 3 });
    /// s.record("Linux", Tally { found: 3, downloaded: 1 });
    /// assert_eq!(s.busiest(), Some(("BIOS", 3)));
    /// ```
    pub fn busiest(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (name, t) in &self.entries {
            match best {
                Some((_, n)) if t.found <= n => {}
                _ => best = Some((name.as_str(), t.found)),
            }
        }
        best
    }

    /// The summary block printed at the end of a run.
    ///
    /// `label` names the package kind, e.g. `.bin`.
    pub fn render(&self, label: &str) -> String {
        let rule = "=".repeat(80);
        let mut out = String::new();
        let _ = writeln!(out, "\n{rule}\nFINAL DOWNLOAD SUMMARY\n{rule}");
        for (name, t) in &self.entries {
            let _ = writeln!(out, "{name}: {}/{} files downloaded", t.downloaded, t.found);
        }
        let _ = writeln!(out, "\nOverall Summary:");
        let _ = writeln!(out, "Total {label} files found: {}", self.total_found());
        let _ = writeln!(out, "Successfully downloaded: {}", self.total_downloaded());
        let _ = writeln!(out, "Failed downloads: {}", self.failed());
        let _ = writeln!(out, "Operating systems with {label} files: {}", self.os_with_files());
        if let Some((name, count)) = self.busiest() {
            let _ = writeln!(out, "OS with most {label} files: {name} ({count} files)");
        }
        out
    }
}

/// Human-readable run output.
pub struct Console<W: Write> {
    out: W,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Raw writer, for interactive prompts.
    pub fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// A free-form status line.
    pub fn note(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{msg}")
    }

    pub fn start(&mut self, targets: usize) -> io::Result<()> {
        writeln!(self.out, "Starting driver collection...")?;
        writeln!(self.out, "Will check {targets} different operating systems")
    }

    pub fn target_banner(&mut self, index: usize, total: usize, os_name: &str) -> io::Result<()> {
        let rule = "=".repeat(60);
        writeln!(self.out, "\n{rule}\nProcessing OS {index}/{total}: {os_name}\n{rule}")
    }

    /// Rewrites the current line; silent when the size is unknown.
    pub fn progress(&mut self, p: Progress) -> io::Result<()> {
        if let Some(pct) = p.percent() {
            write!(self.out, "\r  Progress: {pct:.1}%")?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn samples(&mut self, os_name: &str, items: &[&DownloadItem], limit: usize) -> io::Result<()> {
        if items.is_empty() || limit == 0 {
            return Ok(());
        }
        writeln!(self.out, "Sample files found for {os_name}:")?;
        for (i, item) in items.iter().take(limit).enumerate() {
            writeln!(self.out, "  {}: {}", i + 1, item.file_name)?;
        }
        Ok(())
    }

    pub fn download_dir(&mut self, dir: &Path) -> io::Result<()> {
        writeln!(self.out, "Downloading files to: {}", dir.display())
    }

    pub fn exists(&mut self, file_name: &str) -> io::Result<()> {
        writeln!(self.out, "Skipping {file_name} (already exists)")
    }

    pub fn script_link(&mut self, url: &str) -> io::Result<()> {
        let head: String = url.chars().take(50).collect();
        writeln!(self.out, "Skipping JavaScript URL: {head}...")
    }

    pub fn downloading(&mut self, index: usize, total: usize, file_name: &str) -> io::Result<()> {
        writeln!(self.out, "Downloading {index}/{total}: {file_name}")
    }

    pub fn downloaded(&mut self, file_name: &str) -> io::Result<()> {
        writeln!(self.out, "\n  Successfully downloaded: {file_name}")
    }

    pub fn download_failed(&mut self, url: &str, err: &dyn std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "\n  Error downloading {url}: {err}")
    }

    pub fn completed(&mut self, os_name: &str, tally: Tally) -> io::Result<()> {
        writeln!(
            self.out,
            "Completed {os_name}: {}/{} files downloaded",
            tally.downloaded, tally.found
        )
    }

    pub fn inventory(&mut self, inv: &Inventory) -> io::Result<()> {
        writeln!(self.out, "All download links on the page:")?;
        for (i, link) in inv.links.iter().enumerate() {
            writeln!(self.out, "  {}: {link}", i + 1)?;
        }
        writeln!(self.out, "\nFile type summary:")?;
        for (ext, count) in &inv.by_extension {
            writeln!(self.out, "  .{ext}: {count} files")?;
        }
        writeln!(self.out, "\nTotal files found: {}", inv.links.len())
    }

    pub fn summary(&mut self, summary: &RunSummary, label: &str) -> io::Result<()> {
        write!(self.out, "{}", summary.render(label))?;
        self.out.flush()
    }
}
