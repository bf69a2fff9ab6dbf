// UI layer: the two console flows (browse a folder, fetch a file) plus a
// simple interactive menu using `dialoguer` for when no subcommand is
// given. Everything here prints for humans; nothing is machine-parseable.

use crate::api::DriveApi;
use crate::config::Settings;
use crate::fetcher::Fetcher;
use crate::model::{EntryKind, SearchScope};
use crate::resolver::Resolver;
use anyhow::Result;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, warn};

const RULE_WIDTH: usize = 70;

/// How a flow ended; maps onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::NotFound | Outcome::Failed => ExitCode::from(1),
        }
    }
}

/// Search for folders named `folder_name` anywhere the account can see and
/// print each one's immediate children.
pub fn browse<A: DriveApi + ?Sized>(
    api: &A,
    settings: &Settings,
    account: &str,
    folder_name: &str,
) -> Outcome {
    let resolver = Resolver::new(api, settings);

    println!("🔍 Searching for folder: '{}'", folder_name);
    println!("📧 Service Account: {}", account);
    println!("{}", rule());

    let folders = match resolver.search(&SearchScope::Anywhere, folder_name, Some(EntryKind::Folder)) {
        Ok(folders) => folders,
        Err(e) => {
            error!(folder_name, error = %e, "folder search failed");
            println!("❌ Error searching folder: {}", e);
            return Outcome::Failed;
        }
    };

    if folders.is_empty() {
        println!("\n❌ Folder '{}' not found or not shared with service account.", folder_name);
        println!("\n📋 To fix this:");
        println!("1. Go to Google Drive");
        println!("2. Right-click on '{}' folder", folder_name);
        println!("3. Click 'Share'");
        println!("4. Add email: {}", account);
        println!("5. Set permission to 'Viewer' or 'Editor'");
        return Outcome::NotFound;
    }

    println!("\n✅ Found {} folder(s) named '{}':\n", folders.len(), folder_name);

    for (idx, folder) in folders.iter().enumerate() {
        println!("📁 Folder #{}", idx + 1);
        println!("   Name: {}", folder.name);
        println!("   ID: {}", folder.id);

        println!("\n   📂 Contents:");
        let contents = resolver.list_children(&folder.id);
        if contents.is_empty() {
            println!("      (Empty or no access)");
        }
        for item in &contents {
            println!(
                "      {} {} ({})",
                item.kind.icon(),
                item.name,
                format_size(item.size)
            );
        }
        println!("{}", rule());
    }
    Outcome::Success
}

/// Find `file_name` directly inside `folder_id` and download it to `output`.
pub fn fetch<A: DriveApi + ?Sized>(
    api: &A,
    settings: &Settings,
    folder_id: &str,
    file_name: &str,
    output: &Path,
) -> Outcome {
    let resolver = Resolver::new(api, settings);
    let fetcher = Fetcher::new(api, settings);

    println!("🔍 Searching for: {}", file_name);
    let matches = match resolver.search(&SearchScope::parent(folder_id), file_name, None) {
        Ok(matches) => matches,
        Err(e) => {
            error!(file_name, folder_id, error = %e, "file search failed");
            println!("❌ Error searching file: {}", e);
            return Outcome::Failed;
        }
    };

    let Some(file) = matches.first() else {
        println!("❌ File not found: {}", file_name);
        return Outcome::NotFound;
    };
    if matches.len() > 1 {
        warn!(
            file_name,
            folder_id,
            matches = matches.len(),
            chosen = %file.id,
            "several entries share this name; using the first one returned"
        );
    }

    println!("📄 Found: {} (ID: {})", file.name, file.id);
    println!("📥 Downloading...");

    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos:>3}%") {
        bar.set_style(style);
    }
    let ok = fetcher.download(&file.id, output, |fraction| {
        let percent = (fraction * 100.0) as u64;
        bar.set_position(percent);
        bar.suspend(|| println!("Download {}%", percent));
    });
    bar.finish_and_clear();

    if ok {
        println!("✅ Downloaded to: {}", output.display());
        Outcome::Success
    } else {
        println!("❌ Error downloading file: {}", file.name);
        Outcome::Failed
    }
}

/// Interactive menu. Runs a select loop until the user chooses "Exit"
/// and returns the outcome of the last flow that ran.
pub fn main_menu<A: DriveApi + ?Sized>(api: &A, settings: &Settings, account: &str) -> Result<Outcome> {
    let mut last = Outcome::Success;
    loop {
        let items = vec!["Browse folder", "Download file", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                let name: String = Input::new().with_prompt("Folder name").interact_text()?;
                last = browse(api, settings, account, &name);
            }
            1 => {
                let folder_id: String = Input::new().with_prompt("Parent folder ID").interact_text()?;
                let file_name: String = Input::new().with_prompt("File name").interact_text()?;
                let output: String = Input::new()
                    .with_prompt("Save as")
                    .default(file_name.clone())
                    .interact_text()?;
                last = fetch(api, settings, &folder_id, &file_name, &PathBuf::from(output));
            }
            2 => break,
            _ => {}
        }
    }
    Ok(last)
}

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// `1,234 bytes`, or `N/A` when the size is unknown.
pub fn format_size(size: Option<u64>) -> String {
    let Some(size) = size else {
        return "N/A".to_string();
    };
    let digits = size.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{} bytes", out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{file, folder, FakeDrive};

    #[test]
    fn sizes_get_thousands_separators() {
        assert_eq!(format_size(None), "N/A");
        assert_eq!(format_size(Some(0)), "0 bytes");
        assert_eq!(format_size(Some(999)), "999 bytes");
        assert_eq!(format_size(Some(1234)), "1,234 bytes");
        assert_eq!(format_size(Some(48_213_001)), "48,213,001 bytes");
    }

    #[test]
    fn browse_reports_missing_folder() {
        let drive = FakeDrive::default().with(None, file("f", "개발"));
        let outcome = browse(&drive, &Settings::default(), "reader@example.com", "개발");
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[test]
    fn browse_lists_found_folders() {
        let drive = FakeDrive::default()
            .with(None, folder("d1", "개발"))
            .with(Some("d1"), file("a", "notes.md"));
        let outcome = browse(&drive, &Settings::default(), "reader@example.com", "개발");
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(drive.queries.borrow().len(), 2);
    }

    #[test]
    fn browse_search_failure_is_not_a_miss() {
        let drive = FakeDrive {
            fail_listing: true,
            ..FakeDrive::default()
        };
        assert_eq!(
            browse(&drive, &Settings::default(), "reader@example.com", "개발"),
            Outcome::Failed
        );
    }

    #[test]
    fn fetch_missing_file_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.drawio");
        let drive = FakeDrive::default();
        let outcome = fetch(&drive, &Settings::default(), "F1", "report.drawio", &out);
        assert_eq!(outcome, Outcome::NotFound);
        assert!(!out.exists());
    }

    #[test]
    fn fetch_downloads_first_match() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/report.drawio");
        let drive = FakeDrive::default()
            .with(Some("F1"), file("abc123", "report.drawio"))
            .with_content("abc123", b"<mxfile/>");
        let settings = Settings {
            chunk_size: 4,
            ..Settings::default()
        };
        let outcome = fetch(&drive, &settings, "F1", "report.drawio", &out);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(std::fs::read(&out).unwrap(), b"<mxfile/>");
    }

    #[test]
    fn fetch_download_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.drawio");
        // listed but no content behind the id
        let drive = FakeDrive::default().with(Some("F1"), file("abc123", "report.drawio"));
        let outcome = fetch(&drive, &Settings::default(), "F1", "report.drawio", &out);
        assert_eq!(outcome, Outcome::Failed);
        assert!(!out.exists());
    }
}
