//! Headless command-line front-end

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;

use crate::pdf::{
    Canvas, Command, DocumentBackend, PageLink, PasswordPrompt, ScrollRange, Shell,
    ViewerConfig, ViewerError, ViewerService,
};

#[derive(Debug, Parser)]
#[command(name = "dox", version)]
#[command(about = "Continuous-scroll PDF viewer")]
pub struct Cli {
    /// off, error, warn, info, debug or trace (overrides config.yaml)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    #[must_use]
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
}

/// Options shared by every subcommand that opens a document
#[derive(Debug, clap::Args)]
struct OpenArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Passphrase for encrypted files; prompts on stdin when omitted
    #[arg(long)]
    password: Option<String>,
}

/// Viewport the layout is computed for
#[derive(Debug, clap::Args)]
struct ViewArgs {
    /// Zoom in percent (clamped to 50..=300)
    #[arg(long, default_value_t = 100)]
    zoom: i64,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 1000)]
    height: u32,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print page count and encryption status.
    Info {
        #[command(flatten)]
        open: OpenArgs,
    },
    /// Print the continuous layout as JSON.
    Layout {
        #[command(flatten)]
        open: OpenArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Render the whole strip to a PNG.
    Render {
        #[command(flatten)]
        open: OpenArgs,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_name = "PNG")]
        output: PathBuf,
    },
    /// Report the page shown for a scroll window (fractions 0..=1).
    PageAt {
        #[command(flatten)]
        open: OpenArgs,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_parser = parse_fraction)]
        top: f64,
        #[arg(long, value_parser = parse_fraction)]
        bottom: f64,
    },
    /// Print the text of one page.
    Text {
        #[command(flatten)]
        open: OpenArgs,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Print the links of one page as JSON.
    Links {
        #[command(flatten)]
        open: OpenArgs,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: usize,
    encrypted: bool,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    zoom_percent: u32,
    viewport_width: u32,
    total_width: u32,
    total_height: u32,
    pages: Vec<PageOutput>,
}

#[derive(Debug, Serialize)]
struct PageOutput {
    page: usize,
    offset: u32,
    width: u32,
    height: u32,
    strategy: &'static str,
}

#[derive(Debug, Serialize)]
struct RenderOutput {
    output: String,
    width: u32,
    height: u32,
    pages: usize,
}

#[derive(Debug, Serialize)]
struct PageAtOutput {
    page: usize,
    page_count: usize,
}

#[derive(Debug, Serialize)]
struct LinksOutput<'a> {
    page: usize,
    links: &'a [PageLink],
}

/// Shell for a terminal session: remembers what the viewer asked for so the
/// command loop can act on it.
#[derive(Debug, Default)]
pub struct TerminalShell {
    prompt: Option<PasswordPrompt>,
}

impl TerminalShell {
    /// Password prompt raised since the last call
    pub fn take_prompt(&mut self) -> Option<PasswordPrompt> {
        self.prompt.take()
    }
}

impl Shell for TerminalShell {
    fn present(&mut self, canvas: &Canvas) {
        debug!(
            "Canvas {}x{} with {} pages",
            canvas.width,
            canvas.height,
            canvas.pages.len()
        );
    }

    fn scroll_to(&mut self, fraction: f64) {
        debug!("Scroll to {fraction:.4}");
    }

    fn show_page_indicator(&mut self, page: usize, page_count: usize) {
        debug!("Page {}/{page_count}", page + 1);
    }

    fn show_zoom(&mut self, percent: u32) {
        debug!("Zoom {percent}%");
    }

    fn request_password(&mut self, prompt: &PasswordPrompt) {
        self.prompt = Some(prompt.clone());
    }

    fn report_error(&mut self, error: &ViewerError) {
        debug!("Viewer reported: {error}");
    }

    fn document_closed(&mut self) {
        debug!("Document closed");
    }
}

/// Run a parsed command against MuPDF, writing to stdout and prompting on
/// stdin.
pub fn execute(cli: Cli) -> Result<()> {
    #[cfg(feature = "pdf")]
    {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        execute_with(
            cli,
            crate::pdf::MuPdfBackend::new(),
            crate::settings::viewer_config(),
            &mut stdin.lock(),
            &mut stdout.lock(),
        )
    }
    #[cfg(not(feature = "pdf"))]
    {
        let _ = cli;
        bail!("dox was built without PDF support (enable the `pdf` feature)")
    }
}

/// Run a parsed command against any backend
pub fn execute_with<B: DocumentBackend>(
    cli: Cli,
    backend: B,
    config: ViewerConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let mut shell = TerminalShell::default();
    let mut viewer = ViewerService::with_config(backend, config);

    match cli.command {
        Commands::Info { open } => {
            open_document(&mut viewer, &mut shell, &open, input)?;
            let info = viewer.document_info().context("no document loaded")?;
            let payload = InfoOutput {
                path: open.file.display().to_string(),
                page_count: info.page_count,
                encrypted: info.encrypted,
            };
            print_json(out, &payload)
        }

        Commands::Layout { open, view } => {
            prepare_view(&mut viewer, &mut shell, &view)?;
            open_document(&mut viewer, &mut shell, &open, input)?;
            apply_zoom(&mut viewer, &mut shell, view.zoom)?;

            let layout = viewer.layout();
            let pages = layout
                .entries
                .iter()
                .map(|entry| PageOutput {
                    page: entry.page + 1,
                    offset: entry.offset,
                    width: entry.width,
                    height: entry.height,
                    strategy: viewer
                        .cache()
                        .get(entry.page)
                        .and_then(|cached| cached.rendered())
                        .map_or("none", |rendered| rendered.strategy.as_str()),
                })
                .collect();
            let payload = LayoutOutput {
                zoom_percent: viewer.session().zoom.percent(),
                viewport_width: viewer.session().effective_width(),
                total_width: layout.total_width,
                total_height: layout.total_height,
                pages,
            };
            print_json(out, &payload)
        }

        Commands::Render { open, view, output } => {
            prepare_view(&mut viewer, &mut shell, &view)?;
            open_document(&mut viewer, &mut shell, &open, input)?;
            apply_zoom(&mut viewer, &mut shell, view.zoom)?;

            let canvas = viewer.canvas();
            let image = canvas
                .rasterize()
                .context("nothing to render: no page could be rasterized")?;
            image
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!("Wrote {} ({}x{})", output.display(), canvas.width, canvas.height);

            let payload = RenderOutput {
                output: output.display().to_string(),
                width: image.width(),
                height: image.height(),
                pages: canvas.pages.len(),
            };
            print_json(out, &payload)
        }

        Commands::PageAt {
            open,
            view,
            top,
            bottom,
        } => {
            prepare_view(&mut viewer, &mut shell, &view)?;
            open_document(&mut viewer, &mut shell, &open, input)?;
            apply_zoom(&mut viewer, &mut shell, view.zoom)?;
            viewer.dispatch(Command::Scroll(ScrollRange::new(top, bottom)), &mut shell)?;

            let session = viewer.session();
            let payload = PageAtOutput {
                page: session.current_page + 1,
                page_count: session.page_count,
            };
            print_json(out, &payload)
        }

        Commands::Text { open, page } => {
            open_document(&mut viewer, &mut shell, &open, input)?;
            go_to_page(&mut viewer, &mut shell, page)?;
            let text = viewer.current_page_text()?;
            out.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(out)?;
            }
            Ok(())
        }

        Commands::Links { open, page } => {
            open_document(&mut viewer, &mut shell, &open, input)?;
            go_to_page(&mut viewer, &mut shell, page)?;
            let current = viewer.session().current_page;
            let links = viewer.page_links(current)?;
            print_json(out, &LinksOutput { page, links })
        }
    }
}

fn prepare_view<B: DocumentBackend>(
    viewer: &mut ViewerService<B>,
    shell: &mut TerminalShell,
    view: &ViewArgs,
) -> Result<()> {
    viewer.dispatch(
        Command::Resize {
            width: view.width,
            height: view.height,
        },
        shell,
    )?;
    Ok(())
}

fn apply_zoom<B: DocumentBackend>(
    viewer: &mut ViewerService<B>,
    shell: &mut TerminalShell,
    percent: i64,
) -> Result<()> {
    viewer.dispatch(Command::SubmitZoom(percent.to_string()), shell)?;
    Ok(())
}

fn go_to_page<B: DocumentBackend>(
    viewer: &mut ViewerService<B>,
    shell: &mut TerminalShell,
    page: usize,
) -> Result<()> {
    let page_count = viewer.session().page_count;
    if page == 0 || page > page_count {
        bail!("--page must be between 1 and {page_count}");
    }
    viewer.dispatch(Command::SubmitPage(page.to_string()), shell)?;
    Ok(())
}

/// Open the file and drive the password flow until the document is usable
fn open_document<B: DocumentBackend>(
    viewer: &mut ViewerService<B>,
    shell: &mut TerminalShell,
    open: &OpenArgs,
    input: &mut dyn BufRead,
) -> Result<()> {
    viewer.dispatch(Command::Open(open.file.clone()), shell)?;

    let mut supplied = open.password.clone();
    let interactive = supplied.is_none();
    while let Some(prompt) = shell.take_prompt() {
        let answer = if interactive {
            read_password(&prompt, input)?
        } else if let Some(password) = supplied.take() {
            Some(password)
        } else {
            bail!("incorrect password for {}", open.file.display());
        };

        let cmd = match answer {
            Some(password) => Command::SubmitPassword(password),
            None => Command::CancelPassword,
        };
        viewer.dispatch(cmd, shell)?;
    }

    if !viewer.has_document() {
        bail!("password entry cancelled for {}", open.file.display());
    }
    Ok(())
}

/// Ask on stderr, read one line. EOF or an empty line cancels.
fn read_password(prompt: &PasswordPrompt, input: &mut dyn BufRead) -> Result<Option<String>> {
    eprint!("{}: ", prompt.message());
    std::io::stderr().flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if read == 0 || password.is_empty() {
        Ok(None)
    } else {
        Ok(Some(password.to_string()))
    }
}

fn parse_fraction(value: &str) -> std::result::Result<f64, String> {
    let fraction: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if fraction.is_finite() {
        Ok(fraction)
    } else {
        Err(format!("expected a finite number, got {value}"))
    }
}

fn print_json<T: Serialize>(out: &mut dyn Write, payload: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    writeln!(out, "{json}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{LinkTarget, PageRect};
    use crate::test_utils::{FakeBackend, FakeDocument, FakePage};

    fn run_fake(args: &[&str], backend: FakeBackend, stdin: &str) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut input = stdin.as_bytes();
        let mut out = Vec::new();
        execute_with(cli, backend, ViewerConfig::default(), &mut input, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn backend() -> FakeBackend {
        FakeBackend::new()
            .with_document("plain.pdf", FakeDocument::uniform(3, 300.0, 500.0))
            .with_document(
                "secret.pdf",
                FakeDocument::uniform(2, 300.0, 500.0).encrypted("hunter2"),
            )
    }

    #[test]
    fn info_reports_page_count() {
        let out = run_fake(&["dox", "info", "plain.pdf"], backend(), "").unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["page_count"], 3);
        assert_eq!(json["encrypted"], false);
    }

    #[test]
    fn layout_lists_offsets() {
        let out = run_fake(&["dox", "layout", "plain.pdf"], backend(), "").unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        // Each page renders at 600x1000 with the 2x strategy.
        assert_eq!(json["pages"][0]["offset"], 10);
        assert_eq!(json["pages"][1]["offset"], 1040);
        assert_eq!(json["pages"][0]["strategy"], "rgb high dpi");
        assert_eq!(json["total_height"], 3100);
    }

    #[test]
    fn page_at_maps_center_to_page() {
        let out = run_fake(
            &["dox", "page-at", "plain.pdf", "--top", "0.4", "--bottom", "0.6"],
            backend(),
            "",
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["page"], 2);
    }

    #[test]
    fn page_at_rejects_non_finite_window() {
        for bound in ["NaN", "inf"] {
            let err = run_fake(
                &["dox", "page-at", "plain.pdf", "--top", bound, "--bottom", "0.5"],
                backend(),
                "",
            )
            .unwrap_err();
            assert!(err.to_string().contains("finite"), "{err}");
        }
    }

    #[test]
    fn password_flag_unlocks() {
        let out = run_fake(
            &["dox", "info", "secret.pdf", "--password", "hunter2"],
            backend(),
            "",
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["encrypted"], true);
    }

    #[test]
    fn wrong_password_flag_fails_without_prompting() {
        let err = run_fake(
            &["dox", "info", "secret.pdf", "--password", "nope"],
            backend(),
            "hunter2\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("incorrect password"));
    }

    #[test]
    fn prompt_retries_until_correct() {
        let out = run_fake(&["dox", "info", "secret.pdf"], backend(), "a\nb\nhunter2\n").unwrap();
        assert!(out.contains("\"page_count\": 2"));
    }

    #[test]
    fn empty_line_cancels_prompt() {
        let err = run_fake(&["dox", "info", "secret.pdf"], backend(), "\n").unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn text_and_links_for_one_page() {
        let link = PageLink {
            rect: PageRect::new(0.0, 0.0, 50.0, 20.0),
            target: LinkTarget::External {
                uri: "https://example.com".into(),
            },
        };
        let doc = FakeDocument::with_pages(vec![
            FakePage::new(100.0, 100.0).with_text("first"),
            FakePage::new(100.0, 100.0)
                .with_text("second")
                .with_link(link),
        ]);
        let backend = FakeBackend::new().with_document("doc.pdf", doc);

        let text = run_fake(&["dox", "text", "doc.pdf", "--page", "2"], backend.clone(), "").unwrap();
        assert_eq!(text, "second\n");

        let out = run_fake(&["dox", "links", "doc.pdf", "--page", "2"], backend, "").unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["links"][0]["target"]["kind"], "external");
        assert_eq!(json["links"][0]["target"]["uri"], "https://example.com");
    }

    #[test]
    fn page_out_of_range_is_rejected() {
        let err = run_fake(&["dox", "text", "plain.pdf", "--page", "9"], backend(), "").unwrap_err();
        assert!(err.to_string().contains("between 1 and 3"));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = run_fake(&["dox", "info", "missing.pdf"], backend(), "").unwrap_err();
        assert!(err.to_string().contains("failed to open missing.pdf"));
    }
}
