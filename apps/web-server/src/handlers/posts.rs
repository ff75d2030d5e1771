//! Post pages and form submissions.
//!
//! Successful mutations redirect to the list with a notice. Failed validation
//! redirects back to the form, carrying errors and the submitted text in the
//! flash.

use std::collections::BTreeMap;

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use folio_core::Outcome;
use folio_core::validation::{CONTENT, FieldErrors, PostInput, TITLE};

use crate::flash::Flash;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::multipart::read_post_input;
use crate::state::AppState;
use crate::views::{
    LayoutView, PostFormTemplate, PostIndexTemplate, PostRowView, PostShowTemplate, page,
};

use super::see_other;

/// GET /posts
pub async fn index(
    identity: Identity,
    req: HttpRequest,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let flash = state.flash.take(&req).await;
    let posts = state.posts.list().await?;

    let template = PostIndexTemplate {
        layout: LayoutView::new("Posts", Some(&identity), &flash),
        posts: posts
            .iter()
            .map(|post| PostRowView::new(post, state.posts.image_url(post)))
            .collect(),
    };
    page(&req, StatusCode::OK, &template)
}

/// GET /posts/create
pub async fn create(
    identity: Identity,
    req: HttpRequest,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let flash = state.flash.take(&req).await;
    let form = state.posts.create_form();

    let template = PostFormTemplate::new(
        LayoutView::new("Create Post", Some(&identity), &flash),
        form.post.as_ref(),
        form.image_url,
        &flash,
        state.posts.max_image_bytes(),
    );
    page(&req, StatusCode::OK, &template)
}

/// POST /posts
pub async fn store(
    _identity: Identity,
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let input = read_post_input(payload, state.posts.max_image_bytes()).await?;
    let old = old_input(&input);

    match state.posts.store(input).await? {
        Outcome::Done { notice, .. } => {
            let cookie = state.flash.put(&Flash::notice(notice)).await?;
            Ok(see_other("/posts", Some(cookie)))
        }
        Outcome::Invalid(errors) => back_to_form(&state, "/posts/create", errors, old).await,
    }
}

/// GET /posts/{id}
pub async fn show(
    identity: Identity,
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.show(path.into_inner()).await?;
    let flash = state.flash.take(&req).await;

    let template = PostShowTemplate::new(
        LayoutView::new(post.title.clone(), Some(&identity), &flash),
        &post,
        state.posts.image_url(&post),
    );
    page(&req, StatusCode::OK, &template)
}

/// GET /posts/{id}/edit
pub async fn edit(
    identity: Identity,
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let form = state.posts.edit_form(path.into_inner()).await?;
    let flash = state.flash.take(&req).await;

    let template = PostFormTemplate::new(
        LayoutView::new("Edit Post", Some(&identity), &flash),
        form.post.as_ref(),
        form.image_url,
        &flash,
        state.posts.max_image_bytes(),
    );
    page(&req, StatusCode::OK, &template)
}

/// PUT/PATCH/POST /posts/{id}
pub async fn update(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let input = read_post_input(payload, state.posts.max_image_bytes()).await?;
    let old = old_input(&input);

    match state.posts.update(id, input).await? {
        Outcome::Done { notice, .. } => {
            let cookie = state.flash.put(&Flash::notice(notice)).await?;
            Ok(see_other("/posts", Some(cookie)))
        }
        Outcome::Invalid(errors) => {
            back_to_form(&state, &format!("/posts/{id}/edit"), errors, old).await
        }
    }
}

/// DELETE /posts/{id}, POST /posts/{id}/delete
pub async fn destroy(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let notice = state.posts.destroy(path.into_inner()).await?;
    let cookie = state.flash.put(&Flash::notice(notice)).await?;
    Ok(see_other("/posts", Some(cookie)))
}

/// Submitted text, kept so the form can be re-filled. Files are never kept.
fn old_input(input: &PostInput) -> BTreeMap<String, String> {
    [(TITLE, &input.title), (CONTENT, &input.content)]
        .into_iter()
        .filter_map(|(field, value)| Some((field.to_string(), value.clone()?)))
        .collect()
}

async fn back_to_form(
    state: &AppState,
    location: &str,
    errors: FieldErrors,
    old: BTreeMap<String, String>,
) -> AppResult<HttpResponse> {
    let cookie = state.flash.put(&Flash::invalid(errors, old)).await?;
    Ok(see_other(location, Some(cookie)))
}
