//! HTML output. All markup is assembled through `Markup`, which escapes
//! every piece of text unless it is a `&'static str` literal pushed with
//! `raw`. User-supplied strings therefore cannot inject tags.

pub mod components;

use chrono::{DateTime, Utc};

use crate::models::user::User;

pub const EMPTY_FIELD: &str = "—";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new() -> Self {
        Markup(String::new())
    }

    /// Appends trusted markup. Only string literals are accepted.
    pub fn raw(&mut self, html: &'static str) -> &mut Self {
        self.0.push_str(html);
        self
    }

    /// Appends escaped text.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.0.push_str(&escape_html(text));
        self
    }

    pub fn child(&mut self, markup: Markup) -> &mut Self {
        self.0.push_str(&markup.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Markup {
    fn from(text: &str) -> Self {
        Markup(escape_html(text))
    }
}

/// `<tag a="v" ...>children</tag>` with escaped attribute values.
/// Attributes whose value is `None` are left out.
pub fn element(tag: &'static str, attrs: &[(&'static str, Option<&str>)], children: Markup) -> Markup {
    let mut out = String::with_capacity(children.0.len() + 32);
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        let Some(value) = value else { continue };
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');
    out.push_str(&children.0);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Markup(out)
}

pub fn text_element(tag: &'static str, attrs: &[(&'static str, Option<&str>)], text: &str) -> Markup {
    element(tag, attrs, Markup::from(text))
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Five-star strip for a rating, rounded to the nearest whole star.
pub fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| EMPTY_FIELD.to_string())
}

pub fn pluralize(n: i64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%d.%m.%Y").to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Page shell
// ────────────────────────────────────────────────────────────────────────────

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#faf7f2;color:#2b2118}\
header{display:flex;justify-content:space-between;align-items:center;padding:12px 24px;background:#fff;border-bottom:1px solid #eee}\
nav a,nav button{margin-left:12px}main{max-width:960px;margin:24px auto;padding:0 16px}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:16px}\
.card{background:#fff;border-radius:12px;padding:12px;display:block;color:inherit;text-decoration:none}\
.stars{color:#d9822b}.empty{text-align:center;color:#8a7a6a}.error{color:#b3261e}\
table{width:100%;border-collapse:collapse}td,th{padding:6px;border-bottom:1px solid #eee;text-align:left}";

/// Submits `form[data-action]` as JSON with `data-method`, then reloads or
/// follows `data-next`. Buttons with `data-action` send an empty body.
const SCRIPT: &str = "document.addEventListener('submit',async e=>{const f=e.target;if(!f.dataset.action)return;e.preventDefault();\
const body={};new FormData(f).forEach((v,k)=>{const has=(a,k)=>(f.dataset[a]||'').split(',').includes(k);\
if(has('lines',k)){body[k]=v.split('\\n')}else if(has('numbers',k)){if(v!=='')body[k]=Number(v)}else{body[k]=v}});\
const r=await fetch(f.dataset.action,{method:f.dataset.method||'POST',headers:{'Content-Type':'application/json'},body:JSON.stringify(body)});\
if(r.ok){location.href=f.dataset.next||location.href}else{const j=await r.json().catch(()=>null);const el=f.querySelector('.error');if(el)el.textContent=j&&j.error?j.error.message:'Request failed'}});\
document.addEventListener('click',async e=>{const b=e.target.closest('button[data-action]');if(!b)return;if(b.dataset.confirm&&!confirm(b.dataset.confirm))return;\
const r=await fetch(b.dataset.action,{method:b.dataset.method||'POST'});if(r.ok){location.href=b.dataset.next||location.href}});\
const feed=document.body.dataset.feed;if(feed){const s=new EventSource(feed);s.addEventListener('recipe_created',ev=>{const d=JSON.parse(ev.data);\
const t=document.getElementById('toast');if(t){t.textContent='New recipe: '+d.title;t.hidden=false}})}\
const rs=document.body.dataset.rating;if(rs){const s=new EventSource(rs);s.addEventListener('rating_changed',ev=>{const d=JSON.parse(ev.data);\
const a=document.getElementById('avg');if(a)a.textContent=d.avg_rating.toFixed(1);const c=document.getElementById('count');if(c)c.textContent=d.rating_count})}";

/// Attributes placed on `<body>` for live updates.
#[derive(Debug, Default, Clone)]
pub struct LiveStreams {
    pub feed: Option<String>,
    pub rating: Option<String>,
}

pub fn page(title: &str, user: Option<&User>, live: &LiveStreams, body: Markup) -> String {
    let mut head = Markup::new();
    head.raw("<meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">")
        .child(text_element("title", &[], &format!("{title} · RecipeBook")))
        .raw("<style>")
        .raw(STYLE)
        .raw("</style>");

    let mut main = Markup::new();
    main.child(nav(user))
        .child(element("main", &[], body))
        .raw("<div id=\"toast\" class=\"toast\" hidden></div><script>")
        .raw(SCRIPT)
        .raw("</script>");

    let mut doc = Markup::new();
    doc.raw("<!DOCTYPE html><html lang=\"en\">")
        .child(element("head", &[], head))
        .child(element(
            "body",
            &[
                ("data-feed", live.feed.as_deref()),
                ("data-rating", live.rating.as_deref()),
            ],
            main,
        ))
        .raw("</html>");
    doc.into_string()
}

fn nav(user: Option<&User>) -> Markup {
    let mut links = Markup::new();
    links.raw("<a href=\"/\">Recipes</a>");
    match user {
        Some(user) => {
            links.child(text_element("a", &[("href", Some("/profile"))], user.display_name()));
            if user.is_admin() {
                links.raw("<a href=\"/admin\">Admin</a>");
            }
            links.raw(
                "<button data-action=\"/api/v1/auth/logout\" data-next=\"/\">Log out</button>",
            );
        }
        None => {
            links.raw("<a href=\"/auth\">Log in</a>");
        }
    }

    let mut header = Markup::new();
    header
        .raw("<a href=\"/\"><strong>RecipeBook</strong></a>")
        .child(element("nav", &[], links));
    element("header", &[], header)
}
