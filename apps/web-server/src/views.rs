//! Askama page templates and the view models they render.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use askama::Template;
use chrono::{DateTime, Utc};

use folio_core::domain::Post;
use folio_core::validation::{CONTENT, FEATURED_IMAGE, FieldErrors, TITLE};
use folio_core::workflow::NoticeLevel;
use folio_shared::ErrorResponse;

use crate::flash::{FLASH_COOKIE, Flash, removal_cookie};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppError;

const EXCERPT_CHARS: usize = 80;

/// Chrome shared by every page.
pub struct LayoutView {
    pub title: String,
    pub signed_in_as: Option<String>,
    pub notice: Option<NoticeView>,
}

pub struct NoticeView {
    pub level: &'static str,
    pub message: String,
}

impl LayoutView {
    pub fn new(title: impl Into<String>, identity: Option<&Identity>, flash: &Flash) -> Self {
        Self {
            title: title.into(),
            signed_in_as: identity.map(|identity| identity.email.clone()),
            notice: flash.notice.as_ref().map(|notice| NoticeView {
                level: match notice.level {
                    NoticeLevel::Success => "success",
                    NoticeLevel::Info => "info",
                },
                message: notice.message.clone(),
            }),
        }
    }
}

pub struct PostRowView {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub updated_at: String,
}

impl PostRowView {
    pub fn new(post: &Post, image_url: Option<String>) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            excerpt: excerpt(&post.content),
            image_url,
            updated_at: display_time(post.updated_at),
        }
    }
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct PostIndexTemplate {
    pub layout: LayoutView,
    pub posts: Vec<PostRowView>,
}

/// A text input with its current value and messages.
pub struct FieldView {
    pub value: String,
    pub errors: Vec<String>,
}

impl FieldView {
    fn new(field: &str, stored: Option<&str>, flash: &Flash) -> Self {
        Self {
            // Old input wins over stored values after a failed submission.
            value: flash.old(field).or(stored).unwrap_or_default().to_string(),
            errors: flash.errors.get(field).to_vec(),
        }
    }
}

#[derive(Template)]
#[template(path = "posts/form.html")]
pub struct PostFormTemplate {
    pub layout: LayoutView,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub cancel_url: String,
    pub title: FieldView,
    pub content: FieldView,
    pub image_errors: Vec<String>,
    pub image_url: Option<String>,
    pub image_required: bool,
    pub max_image_kb: usize,
}

impl PostFormTemplate {
    /// Form for a new post, or for editing `post` when given.
    pub fn new(
        layout: LayoutView,
        post: Option<&Post>,
        image_url: Option<String>,
        flash: &Flash,
        max_image_bytes: usize,
    ) -> Self {
        let (heading, action, submit_label, cancel_url) = match post {
            Some(post) => (
                "Edit Post",
                format!("/posts/{}", post.id),
                "Update",
                format!("/posts/{}", post.id),
            ),
            None => ("Create Post", "/posts".to_string(), "Save", "/posts".to_string()),
        };

        Self {
            layout,
            heading,
            action,
            submit_label,
            cancel_url,
            title: FieldView::new(TITLE, post.map(|p| p.title.as_str()), flash),
            content: FieldView::new(CONTENT, post.map(|p| p.content.as_str()), flash),
            image_errors: flash.errors.get(FEATURED_IMAGE).to_vec(),
            image_url,
            image_required: post.is_none(),
            max_image_kb: max_image_bytes / 1024,
        }
    }
}

pub struct PostDetailView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Template)]
#[template(path = "posts/show.html")]
pub struct PostShowTemplate {
    pub layout: LayoutView,
    pub post: PostDetailView,
}

impl PostShowTemplate {
    pub fn new(layout: LayoutView, post: &Post, image_url: Option<String>) -> Self {
        Self {
            layout,
            post: PostDetailView {
                id: post.id.to_string(),
                title: post.title.clone(),
                content: post.content.clone(),
                image_url,
                created_at: display_time(post.created_at),
                updated_at: display_time(post.updated_at),
            },
        }
    }
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: LayoutView,
    pub email: String,
    pub errors: Vec<String>,
}

impl LoginTemplate {
    pub fn new(layout: LayoutView, flash: &Flash) -> Self {
        let errors = flash
            .errors
            .iter()
            .flat_map(|(_, messages)| messages.iter().cloned())
            .collect();

        Self {
            layout,
            email: flash.old("email").unwrap_or_default().to_string(),
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: LayoutView,
    pub status: u16,
    pub heading: String,
    pub detail: Option<String>,
    pub request_id: Option<String>,
}

impl ErrorTemplate {
    pub fn new(error: ErrorResponse) -> Self {
        Self {
            layout: LayoutView::new(error.title.clone(), None, &Flash::default()),
            status: error.status,
            heading: error.title,
            detail: error.detail,
            request_id: error.request_id,
        }
    }
}

/// Render a page. Expires the flash cookie when the request carried one,
/// since the page has consumed it.
pub fn page<T: Template>(
    req: &HttpRequest,
    status: StatusCode,
    template: &T,
) -> Result<HttpResponse, AppError> {
    let body = render(template)?;

    let mut response = HttpResponse::build(status);
    response.content_type("text/html; charset=utf-8");
    if req.cookie(FLASH_COOKIE).is_some() {
        response.cookie(removal_cookie());
    }
    Ok(response.body(body))
}

pub fn render<T: Template>(template: &T) -> Result<String, AppError> {
    template.render().map_err(|err| {
        tracing::error!(error = %err, "Template rendering failed");
        AppError::Internal("Template rendering failed".to_string())
    })
}

/// Flash errors for a single field, used by forms outside the post workflow.
pub fn field_errors(field: &str, message: impl Into<String>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add(field, message);
    errors
}

fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

fn display_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
