//! Response presentation.
//!
//! A request ends in exactly one call to [`ResponseHandler`]. Two handlers
//! ship here: [`PanelPresenter`] renders the response panel as a standalone
//! HTML document, [`TerminalPresenter`] writes to stdout/stderr.

use std::io::Write;

use crate::error::ClientError;

/// Receives the single outcome of a request.
pub trait ResponseHandler {
    fn handle_success(&mut self, body: &str);
    fn handle_error(&mut self, error: &ClientError);
}

/// User-facing message for a failed request.
pub fn error_message(error: &ClientError) -> String {
    format!("Request failed with error: {error}")
}

// ---------------------------------------------------------------------------
// Response panel
// ---------------------------------------------------------------------------

/// HTML panel with three states: loading, response, error.
#[derive(Debug, Default)]
pub struct ResponsePanel {
    html: Option<String>,
}

impl ResponsePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the panel (if needed) and show the loading state.
    pub fn show(&mut self) {
        self.html = Some(render_panel("Loading...", "", false));
    }

    pub fn set_content(&mut self, data: &str) {
        if self.html.is_some() {
            self.html = Some(render_panel("Response:", data, false));
        }
    }

    pub fn set_error(&mut self, message: &str) {
        if self.html.is_some() {
            self.html = Some(render_panel("Error:", message, true));
        }
    }

    pub fn is_open(&self) -> bool {
        self.html.is_some()
    }

    /// Current document, `None` until [`show`](Self::show) was called.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn dispose(&mut self) {
        self.html = None;
    }
}

fn render_panel(title: &str, content: &str, is_error: bool) -> String {
    let error_style = if is_error { "color: #d32f2f;" } else { "" };
    let body = if content.is_empty() {
        String::new()
    } else {
        format!("<pre>{}</pre>", escape_html(content))
    };
    format!(
        r#"<html>
    <head>
        <meta charset="utf-8">
        <title>API Response</title>
        <style>
            body {{
                padding: 10px;
                font-family: monospace;
            }}
            pre {{
                white-space: pre-wrap;
                word-wrap: break-word;
                padding: 10px;
                background-color: #f3f3f3;
                border-radius: 3px;
                {error_style}
            }}
        </style>
    </head>
    <body>
        <h3>{title}</h3>
        {body}
    </body>
</html>
"#
    )
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders outcomes into a [`ResponsePanel`].
#[derive(Debug, Default)]
pub struct PanelPresenter {
    panel: ResponsePanel,
}

impl PanelPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> &ResponsePanel {
        &self.panel
    }
}

impl ResponseHandler for PanelPresenter {
    fn handle_success(&mut self, body: &str) {
        self.panel.show();
        self.panel.set_content(body);
    }

    fn handle_error(&mut self, error: &ClientError) {
        self.panel.show();
        self.panel.set_error(&error.to_string());
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Writes the body to `out` and the error message to `err`.
pub struct TerminalPresenter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl TerminalPresenter<std::io::Stdout, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write, E: Write> TerminalPresenter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> ResponseHandler for TerminalPresenter<O, E> {
    fn handle_success(&mut self, body: &str) {
        if let Err(e) = writeln!(self.out, "{body}").and_then(|_| self.out.flush()) {
            tracing::error!("Failed to write response: {e}");
        }
    }

    fn handle_error(&mut self, error: &ClientError) {
        if let Err(e) = writeln!(self.err, "{}", error_message(error)) {
            tracing::error!("Failed to write error: {e}");
        }
    }
}
