//! HTTP routes
//!
//! Authorization is uneven: account pages redirect to `/login` without a
//! session, the JSON endpoints answer 401, and the admin pages and legacy
//! APIs check nothing at all. No route takes a CSRF token.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Form, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use bank_common::{row_object, value::cell, Row, SqlValue, TRANSFER_COLUMNS};
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::files::{load_help_topic, save_upload, DEFAULT_HELP_TOPIC};
use crate::session::CurrentSession;
use crate::{pages, reports, transfer, AppState};

type HandlerResult = Result<Response, AppError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        // Session lifecycle
        .route("/login", get(login_page).post(login))
        .route("/old-login", get(old_login_page).post(old_login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
        // Account pages
        .route("/dashboard", get(dashboard))
        .route("/transfer", get(transfer_page).post(transfer_form))
        .route("/funds/transfer", post(funds_transfer))
        .route("/profile", get(profile))
        .route("/profile/update-bio", get(update_bio_page).post(update_bio))
        .route("/profile/edit-legacy", get(edit_legacy_page).post(edit_legacy))
        .route("/transaction-history", get(transaction_history))
        .route(
            "/upload-document",
            get(upload_page)
                .post(upload_document)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/account/settings", get(settings_page).post(update_settings))
        .route("/api/transactions", get(api_transactions))
        // Open to anyone
        .route("/admin/reports", get(admin_reports))
        .route("/admin/user-audit", get(admin_user_audit))
        .route("/support/messages", get(support_messages).post(send_support_message))
        .route("/api/v1/transactions/export", get(export_transactions))
        .route("/api/v1/users/list", get(list_users))
        .route("/users/profile/:id", get(user_profile))
        .route("/users/balance/:id", get(user_balance))
        .route("/users/search", get(user_search))
        .route("/files/download/:id", get(download_document))
        .route("/help", get(help))
        .route("/search", get(search))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Redirect to the login page unless the session carries a user.
fn require_user(session: &CurrentSession) -> Result<i64, Response> {
    session
        .user_id()
        .ok_or_else(|| Redirect::to("/login").into_response())
}

fn redirect_with_cookie(to: &str, cookie: String) -> Response {
    ([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response()
}

// ============================================================================
// SESSION LIFECYCLE
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    email: String,
}

async fn index(session: CurrentSession) -> Html<String> {
    pages::index(session.username())
}

async fn login_page() -> Html<String> {
    pages::login(None)
}

async fn old_login_page() -> Html<String> {
    pages::old_login(None)
}

async fn login(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Response {
    sign_in(&state, &session, &form, true).await
}

/// Same injectable check as `/login`, but the session is not marked permanent.
async fn old_login(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Response {
    sign_in(&state, &session, &form, false).await
}

async fn sign_in(state: &AppState, session: &CurrentSession, form: &LoginForm, permanent: bool) -> Response {
    match state.db.authenticate(&form.username, &form.password).await {
        Some(account) => {
            let cookie = state.sessions.start_session(&session.token, &account, permanent);
            state
                .db
                .log_action("login", Some(account.id), Some(&account.username))
                .await;
            tracing::info!(user_id = account.id, permanent, "Login succeeded");
            redirect_with_cookie("/dashboard", cookie)
        }
        None => {
            state
                .db
                .log_action("login_failed", None, Some(&form.username))
                .await;
            let page = if permanent {
                pages::login(Some("Invalid credentials"))
            } else {
                pages::old_login(Some("Invalid credentials"))
            };
            page.into_response()
        }
    }
}

async fn register_page() -> Html<String> {
    pages::register(None)
}

async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if state
        .db
        .register(&form.username, &form.password, &form.email)
        .await
    {
        state.db.log_action("register", None, Some(&form.username)).await;
        Redirect::to("/login").into_response()
    } else {
        pages::register(Some("Registration failed")).into_response()
    }
}

async fn logout(State(state): State<AppState>, session: CurrentSession) -> Response {
    if let Some(user_id) = session.user_id() {
        state.db.log_action("logout", Some(user_id), None).await;
    }
    let cookie = state.sessions.end_session(&session.token);
    redirect_with_cookie("/", cookie)
}

// ============================================================================
// ACCOUNT PAGES
// ============================================================================

async fn dashboard(State(state): State<AppState>, session: CurrentSession) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    let account = state.db.get_user_by_id(&user_id.to_string()).await;
    let transfers = state.db.get_transactions(&user_id.to_string()).await;
    pages::dashboard(session.username(), account.as_ref(), &transfers).into_response()
}

#[derive(Debug, Deserialize)]
struct TransferForm {
    #[serde(default)]
    to_username: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    message: String,
}

async fn transfer_page(session: CurrentSession) -> Response {
    match require_user(&session) {
        Ok(_) => pages::transfer_form(session.username(), None).into_response(),
        Err(redirect) => redirect,
    }
}

async fn transfer_form(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<TransferForm>,
) -> HandlerResult {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return Ok(redirect),
    };

    let amount: f64 = form.amount.trim().parse().map_err(|_| AppError::Internal)?;

    let notice = match state.db.find_by_username(&form.to_username).await {
        Some(recipient) => {
            transfer::transfer(
                &state.db,
                &user_id.into(),
                &recipient.id.into(),
                amount,
                &form.message,
            )
            .await;
            let details = format!("to={} amount={}", recipient.id, amount);
            state.db.log_action("transfer", Some(user_id), Some(&details)).await;
            "Transfer successful!"
        }
        None => "Recipient not found",
    };

    Ok(pages::transfer_form(session.username(), Some(notice)).into_response())
}

/// JSON transfer. The body is only parsed once the caller is known, so an
/// anonymous request gets 401 whatever it sent.
async fn funds_transfer(
    State(state): State<AppState>,
    session: CurrentSession,
    body: Bytes,
) -> HandlerResult {
    let user_id = session.user_id().ok_or(AppError::Unauthorized)?;

    let data: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Unreadable transfer body: {}", e);
        AppError::Internal
    })?;

    let to = json_to_sql(data.get("to_user_id"));
    let amount = match data.get("amount") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or(AppError::Internal)?;
    let message = data.get("message").and_then(Value::as_str).unwrap_or("");

    transfer::transfer(&state.db, &user_id.into(), &to, amount, message).await;
    let details = format!("to={} amount={}", to, amount);
    state.db.log_action("transfer", Some(user_id), Some(&details)).await;

    Ok(Json(serde_json::json!({ "success": true })).into_response())
}

/// Recipient ids are taken as sent: numbers stay numbers, strings stay
/// strings, anything else is spliced in as its JSON text.
fn json_to_sql(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

async fn profile(State(state): State<AppState>, session: CurrentSession) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    let account = state.db.get_user_by_id(&user_id.to_string()).await;
    pages::profile(session.username(), account.as_ref()).into_response()
}

#[derive(Debug, Deserialize)]
struct BioForm {
    #[serde(default)]
    bio: String,
}

async fn update_bio_page(session: CurrentSession) -> Response {
    match require_user(&session) {
        Ok(_) => pages::update_bio(session.username()).into_response(),
        Err(redirect) => redirect,
    }
}

/// Stores the bio for the admin report to run later.
async fn update_bio(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<BioForm>,
) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    state.db.update_bio(user_id, &form.bio).await;
    state.db.log_action("bio_update", Some(user_id), None).await;
    Redirect::to("/profile").into_response()
}

#[derive(Debug, Deserialize)]
struct LegacyProfileForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

async fn edit_legacy_page(State(state): State<AppState>, session: CurrentSession) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    let account = state.db.get_user_by_id(&user_id.to_string()).await;
    pages::edit_legacy(session.username(), account.as_ref(), None).into_response()
}

async fn edit_legacy(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<LegacyProfileForm>,
) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    state
        .db
        .update_profile_legacy(user_id, &form.name, &form.email)
        .await;
    state.db.log_action("profile_update", Some(user_id), None).await;

    let account = state.db.get_user_by_id(&user_id.to_string()).await;
    pages::edit_legacy(session.username(), account.as_ref(), Some("Profile updated!")).into_response()
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    user_id: Option<String>,
}

/// `user_id` defaults to the caller but is never checked against it.
async fn transaction_history(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    let target = query.user_id.unwrap_or_else(|| user_id.to_string());
    let transfers = state.db.get_transactions(&target).await;
    pages::transaction_history(session.username(), &transfers).into_response()
}

async fn upload_page(session: CurrentSession) -> Response {
    match require_user(&session) {
        Ok(_) => pages::upload_document(session.username(), None).into_response(),
        Err(redirect) => redirect,
    }
}

async fn upload_document(
    State(state): State<AppState>,
    session: CurrentSession,
    mut multipart: Multipart,
) -> HandlerResult {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return Ok(redirect),
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let contents = field.bytes().await?;
        upload = Some((filename, contents));
        break;
    }

    let (filename, contents) = match upload {
        Some((filename, contents)) if !filename.is_empty() => (filename, contents),
        _ => {
            return Ok(pages::upload_document(session.username(), Some("No file selected")).into_response())
        }
    };

    let path = save_upload(&state.config.upload_dir, &filename, &contents).await?;
    let document_id = state
        .db
        .record_document(user_id, &filename, &path.to_string_lossy(), contents.len() as i64)
        .await;
    state
        .db
        .log_action("document_upload", Some(user_id), Some(&filename))
        .await;

    let notice = match document_id {
        Some(id) => format!("File uploaded successfully! Document id: {}", id),
        None => "File uploaded successfully!".to_string(),
    };
    Ok(pages::upload_document(session.username(), Some(&notice)).into_response())
}

#[derive(Debug, Deserialize)]
struct SettingsForm {
    theme: Option<String>,
}

async fn settings_page(session: CurrentSession) -> Response {
    match require_user(&session) {
        Ok(_) => pages::account_settings(session.username(), session.theme(), None).into_response(),
        Err(redirect) => redirect,
    }
}

async fn update_settings(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<SettingsForm>,
) -> Response {
    if let Err(redirect) = require_user(&session) {
        return redirect;
    }

    let theme = form.theme.unwrap_or_else(|| "light".to_string());
    state.sessions.set_theme(&session.token, &theme);
    pages::account_settings(session.username(), Some(&theme), Some("Settings updated!")).into_response()
}

/// The caller's own transactions as JSON. No rate limiting.
async fn api_transactions(State(state): State<AppState>, session: CurrentSession) -> HandlerResult {
    let user_id = session.user_id().ok_or(AppError::Unauthorized)?;
    let transfers = state.db.get_transactions(&user_id.to_string()).await;
    Ok(Json(transfer_objects(&transfers)).into_response())
}

// ============================================================================
// OPEN ENDPOINTS
// ============================================================================

/// Runs every stored bio as SQL, then lists them.
async fn admin_reports(State(state): State<AppState>) -> Html<String> {
    let entries = reports::generate_admin_report(&state.db).await;
    pages::admin_reports(&entries)
}

async fn admin_user_audit(State(state): State<AppState>) -> Html<String> {
    pages::user_audit(&state.db.get_audit_logs().await)
}

#[derive(Debug, Deserialize)]
struct SupportForm {
    #[serde(default)]
    message: String,
}

async fn support_messages(State(state): State<AppState>, session: CurrentSession) -> Html<String> {
    let tickets = state.db.get_support_messages().await;
    pages::support_messages(session.username(), &tickets, None)
}

async fn send_support_message(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<SupportForm>,
) -> Response {
    let user_id = match require_user(&session) {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    state.db.create_support_message(user_id, &form.message).await;
    state.db.log_action("support_message", Some(user_id), None).await;

    let tickets = state.db.get_support_messages().await;
    pages::support_messages(session.username(), &tickets, Some("Message sent to support!")).into_response()
}

async fn export_transactions(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(transfer_objects(&state.db.get_all_transactions().await))
}

fn transfer_objects(rows: &[Row]) -> Vec<Value> {
    rows.iter()
        .map(|row| row_object(&TRANSFER_COLUMNS, row))
        .collect()
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<Value>> {
    let users = state
        .db
        .list_user_summaries()
        .await
        .iter()
        .map(|row| {
            serde_json::json!({
                "id": cell(row, 0).to_json(),
                "username": cell(row, 1).to_json(),
                "email": cell(row, 2).to_json(),
                "balance": cell(row, 3).to_json(),
            })
        })
        .collect();
    Json(users)
}

// ============================================================================
// LEGACY JSON API
// ============================================================================

const USER_SEARCH_COLUMNS: [&str; 3] = ["id", "username", "email"];

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Full account record, password included, for any id.
async fn user_profile(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.db.get_user_by_id(&id).await {
        Some(account) => Json(serde_json::json!({ "user": account })).into_response(),
        None => json_error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn user_balance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.db.get_user_by_id(&id).await {
        Some(account) => Json(serde_json::json!({
            "user_id": account.id,
            "username": account.username,
            "balance": account.balance,
        }))
        .into_response(),
        None => json_error(StatusCode::NOT_FOUND, "User not found"),
    }
}

#[derive(Debug, Deserialize)]
struct UserSearchQuery {
    #[serde(default)]
    query: String,
}

async fn user_search(State(state): State<AppState>, Query(search): Query<UserSearchQuery>) -> Json<Value> {
    let users: Vec<Value> = state
        .db
        .search_users(&search.query)
        .await
        .iter()
        .map(|row| row_object(&USER_SEARCH_COLUMNS, row))
        .collect();
    Json(serde_json::json!({ "users": users }))
}

/// Serves any recorded document to anyone who knows its id.
async fn download_document(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let document = match state.db.get_document(&id).await {
        Some(document) => document,
        None => return json_error(StatusCode::NOT_FOUND, "File not found"),
    };

    match tokio::fs::read(&document.path).await {
        Ok(contents) => {
            tracing::info!(document_id = document.id, uploader = ?document.user_id, "Document downloaded");
            let disposition = format!("attachment; filename=\"{}\"", document.filename);
            (
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                contents,
            )
                .into_response()
        }
        Err(e) => {
            tracing::debug!(document_id = document.id, "Document unreadable: {}", e);
            json_error(StatusCode::NOT_FOUND, "File not found")
        }
    }
}

#[derive(Debug, Deserialize)]
struct HelpQuery {
    topic: Option<String>,
}

async fn help(
    State(state): State<AppState>,
    session: CurrentSession,
    Query(query): Query<HelpQuery>,
) -> Html<String> {
    let topic = query.topic.unwrap_or_else(|| DEFAULT_HELP_TOPIC.to_string());
    let content = load_help_topic(&state.config.help_dir, &topic).await;
    pages::help(session.username(), &topic, &content)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(session: CurrentSession, Query(query): Query<SearchQuery>) -> Html<String> {
    pages::search(session.username(), &query.q)
}

async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, pages::not_found())
}
