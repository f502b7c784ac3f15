//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use std::io;
use wheelhouse_ops::{
    FetchReport, IndexNotification, OperationResult, PublishReport, ReleaseInfo,
};
use wheelhouse_types::{ColorChoice, OutputFormat};

/// Whether colors should be emitted for the given choice
pub fn colors_enabled(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => Term::stdout().features().colors_supported(),
    }
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    format: OutputFormat,
    colors: bool,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat, color_choice: ColorChoice) -> Self {
        Self {
            format,
            colors: colors_enabled(color_choice),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            let json = result.to_json().map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            OperationResult::ProjectList(projects) => {
                for project in projects {
                    println!("{project}");
                }
            }
            OperationResult::ReleaseList(releases) => self.render_releases(releases),
            OperationResult::FetchReport(report) => render_fetch_report(report),
            OperationResult::PublishReport(report) => self.render_publish_report(report),
            OperationResult::Success(message) => {
                println!("{}", self.style(Style::new().green()).apply_to(message));
            }
        }
        Ok(())
    }

    fn render_releases(&self, releases: &[ReleaseInfo]) {
        if self.format == OutputFormat::Plain {
            for release in releases {
                println!("{}", release.pin);
            }
            return;
        }

        if releases.is_empty() {
            println!("No releases found.");
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                self.header("Project"),
                self.header("Version"),
                self.header("Format"),
                self.header("Key"),
            ]);

        for release in releases {
            let version = if self.colors {
                Cell::new(&release.version).fg(Color::Green)
            } else {
                Cell::new(&release.version)
            };
            table.add_row(vec![
                Cell::new(&release.project),
                version,
                Cell::new(release.format.to_string()),
                Cell::new(&release.key),
            ]);
        }

        println!("{table}");
    }

    fn render_publish_report(&self, report: &PublishReport) {
        match &report.index {
            IndexNotification::Notified { server, .. } => {
                println!(
                    "{}",
                    self.style(Style::new().green())
                        .apply_to(format!("Index server at {server} updated"))
                );
            }
            IndexNotification::Skipped { reason } => {
                if self.format == OutputFormat::Tty {
                    eprintln!(
                        "{}",
                        self.style(Style::new().dim())
                            .apply_to(format!("Index not updated: {reason}"))
                    );
                }
            }
        }
    }

    fn header(&self, title: &str) -> Cell {
        let cell = Cell::new(title).add_attribute(Attribute::Bold);
        if self.colors {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }

    fn style(&self, style: Style) -> Style {
        style.force_styling(self.colors)
    }
}

fn render_fetch_report(report: &FetchReport) {
    for artifact in &report.fetched {
        if let Some(url) = &artifact.url {
            println!("{url}");
        } else if artifact.destination.is_some() {
            println!("{}", artifact.filename);
        }
    }
}
