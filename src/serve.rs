//! HTTP server and request handlers.
//!
//! A thin dispatch layer on `tiny_http`: it parses the slug out of the
//! request path, extracts form fields, and forwards into the page store
//! and template set. All real behavior lives in those two components;
//! the handlers only translate their results into HTTP responses.
//!
//! # Routes
//!
//! | Route               | Behavior                                        |
//! |---------------------|-------------------------------------------------|
//! | `GET /`             | layout + `home` partial                         |
//! | `GET /view/{slug}`  | page body, or a placeholder when missing        |
//! | `GET /edit/{slug}`  | edit form, pre-filled when the page exists      |
//! | `POST /save/{slug}` | overwrite body, redirect to `/view/{slug}`      |
//! | `POST /create`      | honeypot check, fresh slug, save, redirect      |
//! | anything else       | layout + `404` partial                          |
//!
//! # Concurrency
//!
//! A fixed pool of worker threads shares the listener; each request is
//! handled to completion on one worker. The only shared in-memory state
//! is the immutable [`TemplateSet`] and config, so no synchronization
//! is needed beyond the filesystem itself. Same-slug writes are
//! last-write-wins.

use crate::{
    config::SiteConfig,
    log, slug,
    store::{Page, PageStore, StoreError},
    templates::TemplateSet,
};
use anyhow::{Context, Result};
use std::{
    borrow::Cow,
    fs,
    io::Read,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the page server.
///
/// This function:
/// 1. Loads the template set (fatal on any parse error or missing layout)
/// 2. Ensures the pages directory exists
/// 3. Binds to the configured interface and port (with auto-retry)
/// 4. Sets up Ctrl+C handling for graceful shutdown
/// 5. Runs the configured number of request workers until interrupted
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let templates_dir = config.templates_dir();
    let templates = TemplateSet::load_dir(&templates_dir)
        .with_context(|| format!("Failed to load templates from {}", templates_dir.display()))?;
    log!("templates"; "layout + {} templates from {}",
        templates.partial_names().len(), templates_dir.display());

    let pages_dir = config.pages_dir();
    fs::create_dir_all(&pages_dir)
        .with_context(|| format!("Failed to create {}", pages_dir.display()))?;

    // The app state lives for the whole process; leak it so worker
    // threads can borrow it without reference counting.
    let app: &'static App = Box::leak(Box::new(App::new(PageStore::new(pages_dir), templates)));

    let interface: IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown. unblock() releases
    // one blocked recv() per call, so fire it once per worker.
    let workers = config.serve.workers.max(1);
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let server = Arc::clone(&server);
            thread::spawn(move || {
                // recv() starts failing once unblock() is called
                while let Ok(request) = server.recv() {
                    if let Err(e) = handle_request(request, app) {
                        log!("serve"; "request error: {e:#}");
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                // Will retry silently
                continue;
            }
            Err(e) => {
                // Last attempt failed
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Read one request off the wire, dispatch it, and write the reply.
fn handle_request(mut request: Request, app: &App) -> Result<()> {
    // Decode URL-encoded characters (e.g., %20 → space), then strip
    // any query string before routing
    let url = urlencoding::decode(request.url())
        .map(Cow::into_owned)
        .unwrap_or_default();
    let path = url.split('?').next().unwrap_or(&url).to_owned();

    let mut form_body = String::new();
    if request.method() == &Method::Post {
        request
            .as_reader()
            .read_to_string(&mut form_body)
            .context("Failed to read request body")?;
    }

    let method = request.method().clone();
    let reply = app.dispatch(&method, &path, &form_body);
    respond(request, reply)
}

/// Write a [`Reply`] back as a tiny_http response.
fn respond(request: Request, reply: Reply) -> Result<()> {
    let mut response = Response::from_string(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(Header::from_bytes("Content-Type", reply.content_type).unwrap());
    if let Some(location) = reply.location {
        response = response.with_header(Header::from_bytes("Location", location).unwrap());
    }
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Replies
// ============================================================================

/// An HTTP response, decoupled from the transport so handlers can be
/// exercised without a socket.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    pub location: Option<String>,
}

impl Reply {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            body,
            content_type: "text/html; charset=utf-8",
            location: None,
        }
    }

    fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            body: message.to_owned(),
            content_type: "text/plain; charset=utf-8",
            location: None,
        }
    }

    fn redirect(location: String) -> Self {
        Self {
            status: 302,
            body: String::new(),
            content_type: "text/plain; charset=utf-8",
            location: Some(location),
        }
    }

    fn method_not_allowed() -> Self {
        Self::text(405, "Method Not Allowed")
    }

    /// Log the underlying failure, answer with a generic 500. Request
    /// failures never take the process down after startup.
    fn server_error(err: impl Into<anyhow::Error>) -> Self {
        log!("serve"; "request failed: {:#}", err.into());
        Self::text(500, "Internal Server Error")
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Process-wide request handling state: the page store plus the
/// immutable template set.
pub struct App {
    store: PageStore,
    templates: TemplateSet,
}

impl App {
    pub fn new(store: PageStore, templates: TemplateSet) -> Self {
        Self { store, templates }
    }

    /// Route a request to its handler.
    ///
    /// `form_body` is the raw urlencoded POST body, empty for GETs.
    pub fn dispatch(&self, method: &Method, path: &str, form_body: &str) -> Reply {
        if let Some(slug) = path.strip_prefix("/view/") {
            return match method {
                Method::Get => self.view(slug),
                _ => Reply::method_not_allowed(),
            };
        }
        if let Some(slug) = path.strip_prefix("/edit/") {
            return match method {
                Method::Get => self.edit(slug),
                _ => Reply::method_not_allowed(),
            };
        }
        if let Some(slug) = path.strip_prefix("/save/") {
            return match method {
                Method::Post => self.save(slug, form_body),
                _ => Reply::method_not_allowed(),
            };
        }

        match (method, path) {
            (Method::Get, "/") => self.home(),
            (Method::Post, "/create") => self.create(form_body),
            (_, "/create") => Reply::method_not_allowed(),
            (Method::Get, _) => self.fallback_404(),
            _ => Reply::method_not_allowed(),
        }
    }

    /// `GET /` — landing page: layout wrapped around the `home` partial.
    fn home(&self) -> Reply {
        match self.templates.render_named("home") {
            Ok(html) => Reply::html(200, html),
            Err(e) => Reply::server_error(e),
        }
    }

    /// Any unmatched GET — layout wrapped around the `404` partial.
    fn fallback_404(&self) -> Reply {
        match self.templates.render_named("404") {
            Ok(html) => Reply::html(404, html),
            Err(e) => Reply::server_error(e),
        }
    }

    /// `GET /view/{slug}` — show a page.
    ///
    /// A miss is not an error: the shell renders a placeholder body
    /// echoing the requested slug, with a success status.
    fn view(&self, slug: &str) -> Reply {
        let page = self.store.load(slug).unwrap_or_else(|_| {
            Page::new(slug, format!("The page {slug} could not be found"))
        });
        self.render_shell("view", &page)
    }

    /// `GET /edit/{slug}` — edit form, empty when the page is missing.
    fn edit(&self, slug: &str) -> Reply {
        let page = self
            .store
            .load(slug)
            .unwrap_or_else(|_| Page::new(slug, ""));
        self.render_shell("edit", &page)
    }

    /// `POST /save/{slug}` — overwrite the page with the `body` field,
    /// then redirect to the view.
    fn save(&self, slug: &str, form_body: &str) -> Reply {
        let form = parse_form(form_body);
        let body = form_value(&form, "body").unwrap_or_default();

        match self.store.save(&Page::new(slug, body)) {
            Ok(()) => Reply::redirect(format!("/view/{}", urlencoding::encode(slug))),
            Err(StoreError::InvalidSlug(slug)) => {
                log!("pages"; "rejected save under invalid slug `{slug}`");
                Reply::text(422, "Unprocessable Entity")
            }
            Err(e) => Reply::server_error(e),
        }
    }

    /// `POST /create` — anonymous submission.
    ///
    /// The hidden `username` field is a honeypot: humans leave it
    /// empty, so any value means an automated submission and nothing is
    /// written. Otherwise the page is saved under a freshly generated
    /// slug; no collision check is made against existing pages.
    fn create(&self, form_body: &str) -> Reply {
        let form = parse_form(form_body);
        if !form_value(&form, "username").unwrap_or_default().is_empty() {
            return Reply::text(422, "Unprocessable Entity");
        }

        let content = form_value(&form, "content").unwrap_or_default();
        let slug = match slug::generate() {
            Ok(slug) => slug,
            Err(e) => return Reply::server_error(e),
        };

        match self.store.save(&Page::new(slug.clone(), content)) {
            Ok(()) => {
                log!("pages"; "created {slug}");
                Reply::redirect(format!("/view/{slug}"))
            }
            Err(e) => Reply::server_error(e),
        }
    }

    fn render_shell(&self, shell: &str, page: &Page) -> Reply {
        match self.templates.render_page(shell, page) {
            Ok(html) => Reply::html(200, html),
            Err(e) => Reply::server_error(e),
        }
    }
}

// ============================================================================
// Form Decoding
// ============================================================================

/// Parse an `application/x-www-form-urlencoded` body into pairs.
fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Look up a decoded form field by name.
fn form_value(form: &[(String, String)], key: &str) -> Option<String> {
    form.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

/// Decode one form component: `+` means space, then percent-decoding.
fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .unwrap_or(spaced)
}
