//! Dashboard page
//!
//! The dashboard itself lives in the public directory. When that directory
//! has no `index.html`, a minimal embedded page is served instead so the
//! server is usable out of the box.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::Path;
use tracing::debug;

/// Serve `<public_dir>/index.html`, or the embedded page
pub async fn index(public_dir: &Path) -> Response {
    let path = public_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => html_response(html),
        Err(e) => {
            debug!("No dashboard at {} ({}), serving embedded page", path.display(), e);
            html_response(FALLBACK_INDEX_HTML.to_string())
        }
    }
}

fn html_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

pub const FALLBACK_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Portal E2E Dashboard</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem; background: #111; color: #ddd; }
  #log { font-family: monospace; white-space: pre-wrap; background: #000; padding: 1rem; height: 60vh; overflow-y: auto; }
  .info { color: #ccc; } .success { color: #4caf50; } .warning { color: #ffb300; } .error { color: #f44336; }
  select, button { margin-right: .5rem; }
</style>
</head>
<body>
<h1>Portal E2E Dashboard</h1>
<p>
  <select id="suite"></select>
  <select id="browser"><option>chromium</option><option>firefox</option><option>edge</option></select>
  <label><input type="checkbox" id="headless" checked> headless</label>
  <button id="run">Run suite</button>
</p>
<div id="log"></div>
<script>
const log = document.getElementById('log');
const append = (level, text) => {
  const line = document.createElement('div');
  line.className = level;
  line.textContent = text;
  log.appendChild(line);
  log.scrollTop = log.scrollHeight;
};
fetch('/api/suites').then(r => r.json()).then(suites => {
  const select = document.getElementById('suite');
  suites.forEach(s => select.add(new Option(s.name, s.name)));
  window.suites = suites;
});
const ws = new WebSocket(`${location.protocol === 'https:' ? 'wss' : 'ws'}://${location.host}/ws`);
ws.onmessage = event => {
  const msg = JSON.parse(event.data);
  if (msg.type === 'LOG' || msg.type === 'COMPLETE') append(msg.level, msg.message);
};
document.getElementById('run').onclick = async () => {
  const suite = window.suites.find(s => s.name === document.getElementById('suite').value);
  const data = suite.data ? await fetch(`/api/${suite.data}`).then(r => r.json()) : [];
  ws.send(JSON.stringify({
    type: 'RUN_TESTS',
    tests: suite.tests.map(t => ({ name: t.name, suite: suite.name })),
    emails: suite.data === 'emails' ? data : [],
    countries: suite.data === 'countries' ? data : [],
    browser: document.getElementById('browser').value,
    headless: document.getElementById('headless').checked,
  }));
};
</script>
</body>
</html>
"#;
