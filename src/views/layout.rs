// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page shell shared by every view.

use axum::http::StatusCode;
use leptos::prelude::*;

const STYLE: &str = r#"
body { margin: 0; min-height: 100vh; background: #111827; color: #f3f4f6;
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif; }
main { max-width: 32rem; margin: 0 auto; padding: 2rem 1rem; }
h1 { font-size: 1.5rem; margin: 0; }
h2 { font-size: 1.2rem; margin: 0 0 1rem; }
a { color: #93c5fd; }
.header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 2rem; }
.card { background: #1f2937; border: 1px solid #374151; border-radius: 1rem; padding: 1.5rem; margin-bottom: 2rem; }
.row { display: flex; justify-content: space-between; align-items: center; padding: 1rem;
  background: rgba(55, 65, 81, 0.5); border: 1px solid #4b5563; border-radius: 0.75rem; margin-bottom: 0.75rem; }
.badge { margin-left: 0.75rem; padding: 0.25rem 0.75rem; border-radius: 9999px; font-size: 0.875rem; }
.badge-eaten { background: rgba(34, 197, 94, 0.2); color: #86efac; }
.badge-waiting { background: rgba(234, 179, 8, 0.2); color: #fde047; }
.badge-away { background: rgba(148, 163, 184, 0.2); color: #cbd5e1; }
.status { padding: 0.25rem 1rem; background: rgba(59, 130, 246, 0.2); color: #93c5fd; border-radius: 9999px; font-size: 0.875rem; }
.muted { color: #9ca3af; font-size: 0.875rem; }
.error { margin-bottom: 1.5rem; padding: 1rem; background: rgba(127, 29, 29, 0.5); border: 1px solid #b91c1c; color: #fecaca; border-radius: 0.5rem; }
.notice { margin-bottom: 1.5rem; padding: 1rem; background: rgba(20, 83, 45, 0.5); border: 1px solid #15803d; color: #bbf7d0; border-radius: 0.5rem; }
.actions { display: grid; gap: 1rem; }
button, .button { width: 100%; padding: 1rem 1.5rem; border: 0; border-radius: 0.75rem; font-size: 1rem;
  font-weight: 500; color: #fff; background: #2563eb; cursor: pointer; text-align: center; text-decoration: none; display: block; box-sizing: border-box; }
button:disabled { background: #374151; color: #6b7280; cursor: not-allowed; }
.danger { background: #dc2626; }
.secondary { background: #374151; }
.link { width: auto; padding: 0.5rem; background: none; color: #9ca3af; }
.rank-1 { color: #f87171; } .rank-2 { color: #fb923c; } .rank-3 { color: #facc15; } .rank-n { color: #60a5fa; }
.rank { font-weight: 700; font-size: 1.1rem; margin-right: 0.75rem; }
.overlay { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.5); display: flex; align-items: center;
  justify-content: center; padding: 1rem; }
.modal { background: #1f2937; border-radius: 1rem; max-width: 32rem; width: 100%; padding: 1.5rem;
  max-height: 80vh; overflow-y: auto; }
label { display: block; margin-bottom: 1.5rem; font-size: 0.875rem; }
input[type=time] { display: block; width: 100%; padding: 0.5rem; margin-top: 0.5rem; border-radius: 0.375rem;
  border: 1px solid #4b5563; background: #111827; color: #f3f4f6; box-sizing: border-box; }
"#;

/// Full HTML document around `children`.
///
/// `refresh_secs` makes the browser re-request the page on that interval.
#[component]
pub fn Page(
    #[prop(into)] title: String,
    refresh_secs: Option<u64>,
    children: Children,
) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                {refresh_secs.map(|secs| view! { <meta http-equiv="refresh" content={secs.to_string()}/> })}
                <title>{title}</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <main>{children()}</main>
            </body>
        </html>
    }
}

/// Minimal page for error responses.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let code = status.to_string();
    let message = message.to_string();

    super::render(move || {
        view! {
            <Page title="Meal Tracker" refresh_secs=None>
                <div class="card">
                    <h2>{code}</h2>
                    <p>{message}</p>
                    <a href="/">"Back to Meal Tracker"</a>
                </div>
            </Page>
        }
    })
}
