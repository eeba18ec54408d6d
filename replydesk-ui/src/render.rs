//! Server-side HTML rendering
//!
//! Pages are static templates with `{{NAME}}` placeholders, filled in a
//! single pass so that record text containing placeholder syntax is never
//! expanded. Every value taken from the data file or the request is escaped.

use std::fmt::Write;

use replydesk_common::{ReplyRecord, StatusView, StoreScope};

use crate::session::Session;

const INDEX_HTML: &str = include_str!("../ui/index.html");
const LOGIN_HTML: &str = include_str!("../ui/login.html");

/// Everything the list page shows
#[derive(Debug)]
pub struct ListPage<'a> {
    pub session: &'a Session,
    /// Effective scope (the session scope, possibly narrowed by `?store=`)
    pub scope: &'a StoreScope,
    pub status: StatusView,
    /// Non-deleted records in scope, all posted states, with file positions
    pub records: &'a [(usize, ReplyRecord)],
    /// Known store ids, offered to administrators as a filter
    pub stores: &'a [String],
    /// Record shown with the inline edit form
    pub editing: Option<usize>,
    pub refresh_running: bool,
}

/// Query string carrying the list filter across forms and redirects
///
/// Returns an empty string for the default view.
pub fn list_query(status: StatusView, store: Option<&str>) -> String {
    let mut params = Vec::new();
    if status != StatusView::All {
        params.push(format!("view={}", status.as_str()));
    }
    if let Some(store) = store.filter(|s| !s.is_empty()) {
        params.push(format!("store={}", urlencoding::encode(store)));
    }

    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

/// Render the reply list page
pub fn render_index(page: &ListPage<'_>) -> String {
    let narrowed_store = match (page.session.scope.is_admin(), page.scope) {
        (true, StoreScope::Store(id)) => Some(id.as_str()),
        _ => None,
    };
    let query = list_query(page.status, narrowed_store);

    let posted = page.records.iter().filter(|(_, r)| r.posted).count();
    let summary = format!(
        "全{}件（未投稿 {}件 / 投稿済み {}件）",
        page.records.len(),
        page.records.len() - posted,
        posted
    );

    let mut records = String::new();
    for (index, record) in page
        .records
        .iter()
        .filter(|(_, r)| page.status.matches(r.posted))
    {
        render_record(&mut records, *index, record, page.editing == Some(*index), &query);
    }
    if records.is_empty() {
        records.push_str("<p class=\"empty\">表示する返信はありません。</p>");
    }

    fill(
        INDEX_HTML,
        &[
            ("USER", escape_html(&page.session.username)),
            ("SCOPE", scope_label(page.scope)),
            ("QUERY", escape_html(&query)),
            (
                "REFRESH_DISABLED",
                if page.refresh_running { " disabled" } else { "" }.to_string(),
            ),
            ("STORE_SELECT", store_select(page, narrowed_store)),
            ("VIEW_OPTIONS", view_options(page.status)),
            ("SUMMARY", summary),
            ("RECORDS", records),
        ],
    )
}

/// Render the login form, optionally with an error message
pub fn render_login(error: Option<&str>, username: &str) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape_html(e)))
        .unwrap_or_default();
    fill(
        LOGIN_HTML,
        &[("ERROR", error), ("USERNAME", escape_html(username))],
    )
}

fn render_record(out: &mut String, index: usize, record: &ReplyRecord, editing: bool, query: &str) {
    let query = escape_html(query);
    let class = if record.posted { "reply-box posted" } else { "reply-box" };

    let stars = match record.stars() {
        Some(n) => format!("{}{}", "★".repeat(n as usize), "☆".repeat(5 - n as usize)),
        None => escape_html(&record.star_rating),
    };
    let store = record
        .store_id
        .as_deref()
        .map(|s| format!("｜{}", escape_html(s)))
        .unwrap_or_default();

    let _ = write!(
        out,
        "<div class=\"{class}\" id=\"r{index}\">\
         <div class=\"meta\">{stars}｜{author}{store}</div>\
         <div class=\"meta\">{comment}</div>",
        author = escape_html(&record.author),
        comment = escape_html(&record.comment),
    );

    if editing {
        let _ = write!(
            out,
            "<form action=\"/save/{index}{query}\" method=\"post\">\
             <textarea name=\"reply\">{reply}</textarea>\
             <div class=\"buttons\">\
             <button class=\"btn post-btn\" type=\"submit\">保存</button>\
             <a class=\"btn delete-btn\" href=\"/{query}\">キャンセル</a>\
             </div></form>",
            reply = escape_html(&record.reply),
        );
    } else {
        let _ = write!(
            out,
            "<div class=\"reply\">{reply}</div><div class=\"buttons\">",
            reply = escape_html(&record.reply),
        );
        if record.posted {
            out.push_str("<span class=\"meta\">✅ 投稿済み</span> ");
        } else {
            let _ = write!(
                out,
                "<form class=\"inline\" action=\"/post/{index}{query}\" method=\"post\">\
                 <button class=\"btn post-btn\" type=\"submit\">投稿</button></form>"
            );
        }
        let _ = write!(
            out,
            "<a class=\"btn edit-btn\" href=\"/edit/{index}{query}#r{index}\">編集</a>\
             <form class=\"inline\" action=\"/delete/{index}{query}\" method=\"post\" \
             onsubmit=\"return confirm('削除しますか？');\">\
             <button class=\"btn delete-btn\" type=\"submit\">削除</button></form>\
             </div>"
        );
    }
    out.push_str("</div>\n");
}

fn scope_label(scope: &StoreScope) -> String {
    match scope {
        StoreScope::All => "全店舗".to_string(),
        StoreScope::Store(id) => escape_html(id),
    }
}

fn store_select(page: &ListPage<'_>, selected: Option<&str>) -> String {
    if !page.session.scope.is_admin() {
        return String::new();
    }

    let mut html = String::from("<select name=\"store\"><option value=\"\">全店舗</option>");
    for store in page.stores {
        let _ = write!(
            html,
            "<option value=\"{value}\"{sel}>{value}</option>",
            value = escape_html(store),
            sel = if selected == Some(store.as_str()) { " selected" } else { "" },
        );
    }
    html.push_str("</select>");
    html
}

fn view_options(current: StatusView) -> String {
    [
        (StatusView::All, "すべて"),
        (StatusView::Pending, "未投稿"),
        (StatusView::Posted, "投稿済み"),
    ]
    .iter()
    .map(|(view, label)| {
        format!(
            "<option value=\"{}\"{}>{}</option>",
            view.as_str(),
            if *view == current { " selected" } else { "" },
            label
        )
    })
    .collect()
}

/// Replace `{{NAME}}` placeholders without rescanning inserted values
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = &after[..end];
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
