use std::fs;
use std::io::Read;

use actix_files::NamedFile;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tera::Context as TeraContext;

use crate::server::error::ServeError;
use crate::server::listing::{self, FileEntry};
use crate::server::paths;
use crate::server::AppState;

/// Upper bound on how much of a file the text viewer loads. Anything beyond
/// is cut off and flagged in the page.
pub const VIEW_MAX_BYTES: u64 = 1024 * 1024;

type HandlerResult = Result<HttpResponse, ServeError>;

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(rename = "delete")]
    deleted: Option<String>,
}

impl BrowseQuery {
    fn deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

pub async fn root(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<BrowseQuery>,
) -> HandlerResult {
    if let Some((name, _)) = state.registry.single() {
        let name = name.to_string();
        return browse_at(&state, &req, &name, "", query.deleted());
    }

    let mut entries: Vec<FileEntry> = state
        .registry
        .names()
        .map(|name| FileEntry {
            name: name.to_string(),
            size: String::new(),
            mod_time: String::new(),
            is_dir: true,
            is_text: false,
            path: paths::virtual_path(name, &[]),
        })
        .collect();
    listing::sort_entries(&mut entries);

    let mut context = TeraContext::new();
    context.insert("path", "/");
    context.insert("entries", &entries);
    context.insert("parent", "/");
    context.insert("has_back", &false);
    context.insert("is_root", &true);
    context.insert("show_path", &true);
    context.insert("deleted", &query.deleted());

    render(&state, "index.html", &context)
}

pub async fn browse_root(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<BrowseQuery>,
) -> HandlerResult {
    let name = path.into_inner();
    browse_at(&state, &req, &name, "", query.deleted())
}

pub async fn browse(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<BrowseQuery>,
) -> HandlerResult {
    let (name, tail) = path.into_inner();
    browse_at(&state, &req, &name, &tail, query.deleted())
}

fn browse_at(
    state: &AppState,
    req: &HttpRequest,
    name: &str,
    tail: &str,
    deleted: bool,
) -> HandlerResult {
    let resolved = paths::resolve(&state.registry, name, tail)?;
    let metadata = fs::metadata(&resolved.full).map_err(|_| ServeError::NotFound)?;

    if metadata.is_file() {
        let file =
            NamedFile::open(&resolved.full).map_err(ServeError::io("Failed to open file"))?;
        return Ok(file.into_response(req));
    }

    if !metadata.is_dir() {
        return Err(ServeError::NotFound);
    }

    let entries = listing::list(&resolved.full, name, &resolved.segments)
        .map_err(ServeError::io("Failed to read directory"))?;

    let single = state.registry.single().is_some();
    let at_top = resolved.is_root();
    let parent = if at_top {
        "/".to_string()
    } else {
        paths::parent_path(name, &resolved.segments)
    };

    let mut context = TeraContext::new();
    context.insert("path", &paths::virtual_path(name, &resolved.segments));
    context.insert("entries", &entries);
    context.insert("parent", &parent);
    context.insert("has_back", &!(single && at_top));
    context.insert("is_root", &false);
    context.insert("show_path", &!(single && at_top));
    context.insert("deleted", &deleted);

    render(state, "index.html", &context)
}

pub async fn view(state: web::Data<AppState>, path: web::Path<(String, String)>) -> HandlerResult {
    let (name, tail) = path.into_inner();
    let resolved = paths::resolve(&state.registry, &name, &tail)?;
    let metadata = fs::metadata(&resolved.full).map_err(|_| ServeError::NotFound)?;
    if metadata.is_dir() {
        return Err(ServeError::NotFound);
    }

    let file = fs::File::open(&resolved.full).map_err(|_| ServeError::NotFound)?;
    let mut raw = Vec::new();
    file.take(VIEW_MAX_BYTES)
        .read_to_end(&mut raw)
        .map_err(ServeError::io("Failed to read file"))?;
    let truncated = metadata.len() > VIEW_MAX_BYTES;
    let content = String::from_utf8_lossy(&raw);

    let display_name = resolved.file_name().ok_or(ServeError::NotFound)?;

    let mut context = TeraContext::new();
    context.insert("name", display_name);
    context.insert("path", &paths::virtual_path(&name, &resolved.segments));
    context.insert("parent", &paths::parent_path(&name, &resolved.segments));
    context.insert("content", &content);
    context.insert("truncated", &truncated);

    render(&state, "view.html", &context)
}

pub async fn download(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> HandlerResult {
    let (name, tail) = path.into_inner();
    let resolved = paths::resolve(&state.registry, &name, &tail)?;
    let metadata = fs::metadata(&resolved.full).map_err(|_| ServeError::NotFound)?;
    if metadata.is_dir() {
        return Err(ServeError::NotFound);
    }

    let file_name = resolved.file_name().ok_or(ServeError::NotFound)?.to_string();
    let mime = mime_guess::from_path(&resolved.full).first_or_octet_stream();

    let file = NamedFile::open(&resolved.full)
        .map_err(|_| ServeError::NotFound)?
        .set_content_type(mime)
        .set_content_disposition(header::ContentDisposition {
            disposition: header::DispositionType::Attachment,
            parameters: vec![header::DispositionParam::Filename(file_name)],
        });

    Ok(file.into_response(&req))
}

pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> HandlerResult {
    let (name, tail) = path.into_inner();
    let resolved = paths::resolve(&state.registry, &name, &tail)?;
    let metadata = fs::metadata(&resolved.full).map_err(|_| ServeError::NotFound)?;

    if metadata.is_dir() {
        fs::remove_dir_all(&resolved.full).map_err(ServeError::io("Failed to delete"))?;
    } else {
        fs::remove_file(&resolved.full).map_err(ServeError::io("Failed to delete"))?;
    }

    let parent = paths::parent_path(&name, &resolved.segments);

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("{}?delete=1", parent)))
        .finish())
}

fn render(state: &AppState, template: &str, context: &TeraContext) -> HandlerResult {
    let html = state.tera.render(template, context)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
