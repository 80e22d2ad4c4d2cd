// src/handlers.rs
use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;

use crate::colors::ColorResolver;
use crate::cookies::{CookieSigner, Theme, CATEGORIES_COOKIE, THEME_COOKIE};
use crate::question_store::QuestionStore;
use crate::record::{Category, RecordId};
use crate::render::{self, QuestionPage, VERSION};

const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// Optional routes and rendering switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Features {
    pub reload: bool,
    pub export: bool,
    pub settings: bool,
    pub trusted_markup: bool,
}

#[derive(Deserialize)]
struct SelectedCategories {
    categories: Vec<String>,
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Cross-Origin-Embedder-Policy", "require-corp"))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Resource-Policy", "same-site"))
        .add((
            "Permissions-Policy",
            "geolocation=(), midi=(), sync-xhr=(), microphone=(), camera=(), magnetometer=(), gyroscope=(), fullscreen=(), payment=()",
        ))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("X-Xss-Protection", "1; mode=block"))
}

pub fn configure(cfg: &mut web::ServiceConfig, features: Features) {
    cfg.app_data(web::Data::new(features))
        .service(home)
        .service(question)
        .service(categories)
        .service(version)
        .service(stylesheet)
        .service(script);

    if features.reload {
        cfg.service(reload);
    }
    if features.export {
        cfg.service(export);
    }
    if features.settings {
        cfg.service(settings_page)
            .service(settings_categories)
            .service(settings_theme);
    }
}

#[get("/")]
pub async fn home(
    req: HttpRequest,
    store: web::Data<Arc<QuestionStore>>,
    signer: web::Data<CookieSigner>,
) -> impl Responder {
    let enabled = signer.enabled_categories(&req);
    let id = store
        .random_id(&enabled)
        .map(|id| id.to_string())
        .unwrap_or_else(|| RecordId::NIL.to_string());

    debug!("Redirecting to question {}", id);
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/q/{}", id)))
        .finish()
}

#[get("/q/{id}")]
pub async fn question(
    req: HttpRequest,
    path: web::Path<String>,
    store: web::Data<Arc<QuestionStore>>,
    colors: web::Data<ColorResolver>,
    signer: web::Data<CookieSigner>,
    features: web::Data<Features>,
) -> impl Responder {
    let id = RecordId::from(path.into_inner());
    // One snapshot for the whole request.
    let snapshot = store.snapshot();

    let page = if snapshot.is_empty() {
        QuestionPage::nothing_loaded(colors.error().clone())
    } else {
        match snapshot.get(&id) {
            Some(record) => {
                let color = colors.resolve(&record.category).clone();
                QuestionPage::for_record(&record, color, features.trusted_markup)
            }
            None => {
                debug!("Question '{}' not found in store.", id);
                QuestionPage::not_found(colors.error().clone())
            }
        }
    };

    let page = page
        .with_theme(signer.theme(&req))
        .with_settings_link(features.settings);

    HttpResponse::Ok()
        .content_type(HTML)
        .insert_header((header::CONTENT_SECURITY_POLICY, page.content_security_policy()))
        .body(page.render())
}

#[get("/categories")]
pub async fn categories(store: web::Data<Arc<QuestionStore>>) -> impl Responder {
    let mut body = String::new();
    for category in store.list_categories() {
        let _ = writeln!(body, "{}", category);
    }

    HttpResponse::Ok().content_type(TEXT).body(body)
}

#[post("/reload")]
pub async fn reload(store: web::Data<Arc<QuestionStore>>) -> impl Responder {
    let started = Instant::now();
    let store = store.get_ref().clone();

    match web::block(move || store.reload()).await {
        Ok(summary) => HttpResponse::Ok().content_type(TEXT).body(format!(
            "Loaded {} questions across {} categories in {:?}.\n",
            summary.records,
            summary.categories,
            started.elapsed()
        )),
        Err(e) => {
            error!("Reload task failed: {:?}", e);
            HttpResponse::InternalServerError()
                .content_type(TEXT)
                .body("500 Internal Server Error\n")
        }
    }
}

#[get("/export")]
pub async fn export(store: web::Data<Arc<QuestionStore>>) -> impl Responder {
    let snapshot = store.snapshot();
    let mut body = String::new();
    for record in snapshot.records() {
        let _ = write!(
            body,
            "Category: {}\nQuestion: {}\nAnswer: {}\n\n",
            record.category, record.question, record.answer
        );
    }

    HttpResponse::Ok()
        .content_type(TEXT)
        .insert_header((header::CONTENT_SECURITY_POLICY, "default-src 'self';"))
        .body(body)
}

#[get("/settings")]
pub async fn settings_page(
    req: HttpRequest,
    store: web::Data<Arc<QuestionStore>>,
    signer: web::Data<CookieSigner>,
) -> impl Responder {
    let all_categories = store.list_categories();
    let mut selected = signer.enabled_categories(&req);
    if selected.is_empty() {
        selected = all_categories.clone();
    }

    HttpResponse::Ok()
        .content_type(HTML)
        .insert_header((header::CONTENT_SECURITY_POLICY, "default-src 'self';"))
        .body(render::render_settings(signer.theme(&req), &all_categories, &selected))
}

#[post("/settings/categories")]
pub async fn settings_categories(
    body: web::Json<SelectedCategories>,
    store: web::Data<Arc<QuestionStore>>,
    signer: web::Data<CookieSigner>,
) -> impl Responder {
    let known = store.list_categories();
    let chosen: Vec<&str> = body
        .categories
        .iter()
        .map(String::as_str)
        .filter(|c| known.contains(&Category::from(*c)))
        .collect();

    info!("Selected {}/{} categories", chosen.len(), known.len());
    let cookie = signer.cookie(CATEGORIES_COOKIE, &chosen.join(","));

    HttpResponse::Ok()
        .cookie(cookie)
        .content_type(TEXT)
        .body(format!("Set cookie for {}.\n", CATEGORIES_COOKIE))
}

#[post("/settings/theme/{theme}")]
pub async fn settings_theme(
    path: web::Path<String>,
    signer: web::Data<CookieSigner>,
) -> impl Responder {
    let theme = path.into_inner();
    if theme != Theme::Light.as_str() && theme != Theme::Dark.as_str() {
        warn!("Rejected unknown theme '{}'", theme);
        return HttpResponse::BadRequest().json(json!({"error": "Invalid theme"}));
    }

    HttpResponse::Ok()
        .cookie(signer.cookie(THEME_COOKIE, &theme))
        .content_type(TEXT)
        .body(format!("Set cookie for {}.\n", THEME_COOKIE))
}

#[get("/version")]
pub async fn version() -> impl Responder {
    HttpResponse::Ok()
        .content_type(TEXT)
        .body(format!("trivia v{}\n", VERSION))
}

#[get("/css/{name}")]
pub async fn stylesheet(path: web::Path<String>) -> impl Responder {
    let body = match path.as_str() {
        "darkMode.css" => include_str!("../assets/css/darkMode.css"),
        "lightMode.css" => include_str!("../assets/css/lightMode.css"),
        "trivia.css" => include_str!("../assets/css/trivia.css"),
        _ => return HttpResponse::NotFound().finish(),
    };

    HttpResponse::Ok()
        .content_type("text/css; charset=utf-8")
        .insert_header((header::CONTENT_SECURITY_POLICY, "default-src 'self'"))
        .body(body)
}

#[get("/js/{name}")]
pub async fn script(path: web::Path<String>) -> impl Responder {
    let body = match path.as_str() {
        "toggleAnswer.js" => include_str!("../assets/js/toggleAnswer.js"),
        "settings.js" => include_str!("../assets/js/settings.js"),
        _ => return HttpResponse::NotFound().finish(),
    };

    HttpResponse::Ok()
        .content_type("text/javascript; charset=utf-8")
        .insert_header((header::CONTENT_SECURITY_POLICY, "default-src 'self'"))
        .body(body)
}
