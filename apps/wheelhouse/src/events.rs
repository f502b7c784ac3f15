//! Event handling and progress display

use console::Style;
use std::io::{self, Write};
use wheelhouse_events::{AppEvent, GeneralEvent, IndexEvent, ResolverEvent, TransferEvent};

use crate::logging::log_event_with_tracing;

/// Event handler for progress display and user feedback
///
/// Upload progress goes to `out` as `Uploading {key} ...`, one dot per
/// committed chunk, then ` done!` or ` failed! :(`. Warnings and debug
/// details go to stderr.
pub struct EventHandler<W: Write = io::Stdout> {
    out: W,
    colors_enabled: bool,
    debug_enabled: bool,
    /// JSON mode: log only, print nothing
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self::with_writer(io::stdout(), colors_enabled, debug_enabled, quiet)
    }
}

impl<W: Write> EventHandler<W> {
    pub fn with_writer(out: W, colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            out,
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);
        if self.quiet {
            return;
        }

        match event {
            AppEvent::Transfer(event) => self.handle_transfer(event),
            AppEvent::General(event) => self.handle_general(event),
            AppEvent::Resolver(ResolverEvent::CandidateSelected {
                requirement,
                key,
                format,
                ..
            }) if self.debug_enabled => {
                self.show_debug(&format!("{requirement} -> {key} ({format})"));
            }
            AppEvent::Index(IndexEvent::RebuildSkipped { reason }) if self.debug_enabled => {
                self.show_debug(&format!("index rebuild skipped: {reason}"));
            }
            _ => {}
        }
    }

    fn handle_transfer(&mut self, event: TransferEvent) {
        match event {
            TransferEvent::SessionOpened { key, .. } => {
                self.progress(&format!("Uploading {key} ..."));
            }
            TransferEvent::ChunkUploaded { .. } => self.progress("."),
            TransferEvent::Committed { .. } => self.progress(" done!\n"),
            TransferEvent::Aborted { .. } => self.progress(" failed! :(\n"),
            TransferEvent::ChunkRetrying {
                part_number,
                attempt,
                max_attempts,
                error,
                ..
            } if self.debug_enabled => {
                self.show_debug(&format!(
                    "part {part_number} attempt {attempt}/{max_attempts} failed: {error}"
                ));
            }
            _ => {}
        }
    }

    fn handle_general(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                let text = match context {
                    Some(context) => format!("Warning: {message} ({context})"),
                    None => format!("Warning: {message}"),
                };
                eprintln!("{}", self.style(Style::new().yellow()).apply_to(text));
            }
            GeneralEvent::Error { message, details } => {
                let text = match details {
                    Some(details) => format!("Error: {message}: {details}"),
                    None => format!("Error: {message}"),
                };
                eprintln!("{}", self.style(Style::new().red()).apply_to(text));
            }
            GeneralEvent::DebugLog { message, .. } if self.debug_enabled => {
                self.show_debug(&message);
            }
            _ => {}
        }
    }

    fn progress(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn show_debug(&self, message: &str) {
        eprintln!("{}", self.style(Style::new().dim()).apply_to(message));
    }

    fn style(&self, style: Style) -> Style {
        style.force_styling(self.colors_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelhouse_events::FailureContext;

    fn transfer(event: TransferEvent) -> AppEvent {
        AppEvent::Transfer(event)
    }

    fn opened(key: &str) -> AppEvent {
        transfer(TransferEvent::SessionOpened {
            key: key.to_string(),
            upload_id: "u1".to_string(),
            total_size: 10,
            chunk_size: 5,
            chunk_count: 2,
        })
    }

    fn chunk(key: &str, part_number: u32) -> AppEvent {
        transfer(TransferEvent::ChunkUploaded {
            key: key.to_string(),
            part_number,
            bytes: 5,
        })
    }

    #[test]
    fn test_successful_upload_progress() {
        let mut handler = EventHandler::with_writer(Vec::new(), false, false, false);
        let key = "pkg/pkg-1.0.tar.gz";
        handler.handle_event(opened(key));
        handler.handle_event(chunk(key, 2));
        handler.handle_event(chunk(key, 1));
        handler.handle_event(transfer(TransferEvent::Committed {
            key: key.to_string(),
            parts: 2,
        }));

        let out = String::from_utf8(handler.into_writer()).unwrap();
        assert_eq!(out, "Uploading pkg/pkg-1.0.tar.gz ..... done!\n");
    }

    #[test]
    fn test_failed_upload_progress() {
        let mut handler = EventHandler::with_writer(Vec::new(), false, false, false);
        let key = "pkg/pkg-1.0.tar.gz";
        handler.handle_event(opened(key));
        handler.handle_event(chunk(key, 1));
        handler.handle_event(transfer(TransferEvent::Aborted {
            key: key.to_string(),
            expected_parts: 2,
            committed_parts: 1,
            failure: FailureContext::new(None::<String>, "boom", None::<String>, false),
        }));

        let out = String::from_utf8(handler.into_writer()).unwrap();
        assert_eq!(out, "Uploading pkg/pkg-1.0.tar.gz .... failed! :(\n");
    }

    #[test]
    fn test_quiet_mode_prints_nothing() {
        let mut handler = EventHandler::with_writer(Vec::new(), false, false, true);
        handler.handle_event(opened("pkg/pkg-1.0.tar.gz"));
        handler.handle_event(chunk("pkg/pkg-1.0.tar.gz", 1));
        assert!(handler.into_writer().is_empty());
    }
}
