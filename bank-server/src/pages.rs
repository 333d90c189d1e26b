//! HTML pages
//!
//! Plain `format!` templates. Values go through [`esc`] unless the page is
//! meant to show stored markup as-is: transfer messages, support messages and
//! help file contents are written raw.

use axum::response::Html;
use bank_common::{value::cell, Account, AuditEntry, Row, SqlValue, SupportTicket};

use crate::reports::ReportEntry;

fn esc(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

fn esc_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

fn layout(title: &str, user: Option<&str>, body: &str) -> Html<String> {
    let nav = match user {
        Some(name) => format!(
            r#"<a href="/dashboard">Dashboard</a> | <a href="/transfer">Transfer</a> | <a href="/profile">Profile</a> | <a href="/support/messages">Support</a> | <a href="/upload-document">Documents</a> | <a href="/account/settings">Settings</a> | <a href="/help">Help</a> | {} (<a href="/logout">Logout</a>)"#,
            esc(name)
        ),
        None => r#"<a href="/">Home</a> | <a href="/login">Login</a> | <a href="/register">Register</a> | <a href="/help">Help</a>"#.to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} - BuggyBank</title></head>
<body>
<nav>{nav}</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = esc(title),
        nav = nav,
        body = body
    ))
}

fn notice(message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<p class="notice">{}</p>"#, esc(m)))
        .unwrap_or_default()
}

fn text_cell(value: &SqlValue) -> String {
    if value.is_null() {
        String::new()
    } else {
        esc(&value.to_string())
    }
}

/// Render transfer rows cell by cell. Whatever the query produced is shown,
/// so a `UNION` payload's columns appear in the table.
fn transfer_rows(transfers: &[Row]) -> String {
    if transfers.is_empty() {
        return "<p>No transactions.</p>".to_string();
    }

    let rows: String = transfers
        .iter()
        .map(|t| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                text_cell(cell(t, 0)),
                text_cell(cell(t, 1)),
                text_cell(cell(t, 2)),
                text_cell(cell(t, 3)),
                // Stored message goes out unescaped
                cell(t, 4).as_text().unwrap_or_default(),
                text_cell(cell(t, 5)),
            )
        })
        .collect();

    format!(
        "<table>\n<tr><th>ID</th><th>From</th><th>To</th><th>Amount</th><th>Message</th><th>Date</th></tr>\n{}</table>",
        rows
    )
}

pub fn index(user: Option<&str>) -> Html<String> {
    layout(
        "Welcome to BuggyBank",
        user,
        "<p>Online banking for everyone. Log in to manage your money.</p>",
    )
}

pub fn login(error: Option<&str>) -> Html<String> {
    login_form("Login", "/login", error)
}

pub fn old_login(error: Option<&str>) -> Html<String> {
    login_form("Legacy Login", "/old-login", error)
}

fn login_form(title: &str, action: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{}
<form method="post" action="{}">
<label>Username <input name="username"></label>
<label>Password <input name="password" type="password"></label>
<button type="submit">Login</button>
</form>"#,
        notice(error),
        action
    );
    layout(title, None, &body)
}

pub fn register(message: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{}
<form method="post" action="/register">
<label>Username <input name="username"></label>
<label>Password <input name="password" type="password"></label>
<label>Email <input name="email"></label>
<button type="submit">Register</button>
</form>"#,
        notice(message)
    );
    layout("Register", None, &body)
}

pub fn dashboard(user: Option<&str>, account: Option<&Account>, transfers: &[Row]) -> Html<String> {
    let summary = match account {
        Some(a) => format!(
            "<p>Hello, {}. Your balance is <strong>${:.2}</strong>.</p>",
            esc(&a.username),
            a.balance
        ),
        None => "<p>Account not found.</p>".to_string(),
    };
    let body = format!("{}\n<h2>Recent transactions</h2>\n{}", summary, transfer_rows(transfers));
    layout("Dashboard", user, &body)
}

pub fn transfer_form(user: Option<&str>, message: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{}
<form method="post" action="/transfer">
<label>Recipient <input name="to_username"></label>
<label>Amount <input name="amount"></label>
<label>Message <textarea name="message"></textarea></label>
<button type="submit">Send</button>
</form>"#,
        notice(message)
    );
    layout("Transfer Money", user, &body)
}

pub fn profile(user: Option<&str>, account: Option<&Account>) -> Html<String> {
    let body = match account {
        Some(a) => format!(
            r#"<dl>
<dt>Username</dt><dd>{}</dd>
<dt>Email</dt><dd>{}</dd>
<dt>Balance</dt><dd>${:.2}</dd>
<dt>Bio</dt><dd>{}</dd>
</dl>
<p><a href="/profile/update-bio">Update bio</a></p>"#,
            esc(&a.username),
            esc(a.email.as_deref().unwrap_or("")),
            a.balance,
            esc(a.bio.as_deref().unwrap_or("")),
        ),
        None => "<p>Account not found.</p>".to_string(),
    };
    layout("Profile", user, &body)
}

pub fn update_bio(user: Option<&str>) -> Html<String> {
    let body = r#"<form method="post" action="/profile/update-bio">
<label>Bio <textarea name="bio"></textarea></label>
<button type="submit">Save</button>
</form>"#;
    layout("Update Bio", user, body)
}

pub fn edit_legacy(user: Option<&str>, account: Option<&Account>, message: Option<&str>) -> Html<String> {
    let (name, email) = account
        .map(|a| (a.username.as_str(), a.email.as_deref().unwrap_or("")))
        .unwrap_or(("", ""));
    let body = format!(
        r#"{}
<form method="post" action="/profile/edit-legacy">
<label>Name <input name="name" value="{}"></label>
<label>Email <input name="email" value="{}"></label>
<button type="submit">Save</button>
</form>"#,
        notice(message),
        esc_attr(name),
        esc_attr(email)
    );
    layout("Edit Profile (Legacy)", user, &body)
}

pub fn admin_reports(entries: &[ReportEntry]) -> Html<String> {
    let rows: String = entries
        .iter()
        .map(|e| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                e.user_id.map(|id| id.to_string()).unwrap_or_default(),
                esc(&e.username),
                esc(e.bio.as_deref().unwrap_or("")),
            )
        })
        .collect();
    let body = format!(
        "<table>\n<tr><th>ID</th><th>Username</th><th>Bio</th></tr>\n{}</table>",
        rows
    );
    layout("User Reports", None, &body)
}

pub fn support_messages(user: Option<&str>, tickets: &[SupportTicket], message: Option<&str>) -> Html<String> {
    let list: String = tickets
        .iter()
        .map(|t| {
            format!(
                "<div class=\"ticket\"><p>#{} from user {}</p><div>{}</div></div>\n",
                t.id,
                t.user_id.map(|id| id.to_string()).unwrap_or_else(|| "unknown".to_string()),
                // Raw body, same as the admin bot sees it
                t.message,
            )
        })
        .collect();
    let body = format!(
        r#"{}
<form method="post" action="/support/messages">
<label>Message <textarea name="message"></textarea></label>
<button type="submit">Send</button>
</form>
<h2>Messages</h2>
{}"#,
        notice(message),
        list
    );
    layout("Support", user, &body)
}

pub fn transaction_history(user: Option<&str>, transfers: &[Row]) -> Html<String> {
    layout("Transaction History", user, &transfer_rows(transfers))
}

pub fn upload_document(user: Option<&str>, message: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{}
<form method="post" action="/upload-document" enctype="multipart/form-data">
<input type="file" name="file">
<button type="submit">Upload</button>
</form>"#,
        notice(message)
    );
    layout("Upload Document", user, &body)
}

pub fn account_settings(user: Option<&str>, theme: Option<&str>, message: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{}
<p>Current theme: {}</p>
<form method="post" action="/account/settings">
<label>Theme <input name="theme" value="{}"></label>
<button type="submit">Save</button>
</form>"#,
        notice(message),
        esc(theme.unwrap_or("light")),
        esc_attr(theme.unwrap_or("light"))
    );
    layout("Account Settings", user, &body)
}

pub fn help(user: Option<&str>, topic: &str, content: &str) -> Html<String> {
    let body = format!(
        r#"<h2>{}</h2>
<pre>{}</pre>
<p>Topics: <a href="/help?topic=welcome">welcome</a> <a href="/help?topic=transfers">transfers</a> <a href="/help?topic=support">support</a></p>"#,
        esc(topic),
        content
    );
    layout("Help", user, &body)
}

pub fn user_audit(entries: &[AuditEntry]) -> Html<String> {
    let rows: String = entries
        .iter()
        .map(|e| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                e.id,
                esc(&e.action),
                e.user_id.map(|id| id.to_string()).unwrap_or_default(),
                esc(e.details.as_deref().unwrap_or("")),
                esc(e.created_at.as_deref().unwrap_or("")),
            )
        })
        .collect();
    let body = format!(
        "<table>\n<tr><th>ID</th><th>Action</th><th>User</th><th>Details</th><th>Date</th></tr>\n{}</table>",
        rows
    );
    layout("User Audit", None, &body)
}

/// The query is echoed escaped; the inline script then copies it from the
/// URL into the DOM through `innerHTML`.
pub fn search(user: Option<&str>, query: &str) -> Html<String> {
    let body = format!(
        r#"<form method="get" action="/search"><input name="q" value="{}"><button type="submit">Search</button></form>
<p>You searched for: {}</p>
<div id="results"></div>
<script>
var q = new URLSearchParams(window.location.search).get('q') || '';
document.getElementById('results').innerHTML = 'Results for: ' + q;
</script>"#,
        esc_attr(query),
        esc(query)
    );
    layout("Search", user, &body)
}

pub fn not_found() -> Html<String> {
    layout("Page Not Found", None, "<p>The page you requested does not exist.</p>")
}

pub fn server_error() -> Html<String> {
    layout("Error", None, "<p>Something went wrong.</p>")
}
