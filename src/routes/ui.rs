use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>AI Newsletter Generator</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; color: #1d1d1f; display: flex; min-height: 100vh; }
    aside { width: 300px; padding: 1.5rem; background: #f4f5f7; border-right: 1px solid #ddd; }
    main { flex: 1; padding: 2rem; max-width: 900px; }
    h1 { margin-top: 0; }
    label { display: block; margin-top: 0.9rem; font-weight: 600; }
    input[type=text], input[type=password], select { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    .check { font-weight: normal; }
    button { margin-top: 1rem; padding: 0.6rem 1rem; width: 100%; }
    button:disabled { opacity: 0.5; }
    .note { font-size: 0.85rem; color: #555; }
    .status { margin: 1rem 0; color: #555; }
    .error { color: #b00020; white-space: pre-wrap; }
    .newsletter { white-space: pre-wrap; line-height: 1.5; border: 1px solid #ddd; padding: 1rem; border-radius: 8px; }
    details { margin-top: 1rem; }
    details pre { white-space: pre-wrap; background: #f6f8fa; padding: 1rem; }
  </style>
</head>
<body>
  <aside>
    <h2>Configuration</h2>
    <label for="openaiKey">OpenAI API Key</label>
    <input id="openaiKey" type="password" autocomplete="off" />
    <label for="exaKey">Exa API Key</label>
    <input id="exaKey" type="password" autocomplete="off" />
    <p id="keyNote" class="note"></p>
    <label for="model">Model</label>
    <select id="model"></select>
    <label class="check"><input id="showIntermediate" type="checkbox" /> Show intermediate results</label>
    <p class="note">Newsletters are generated by four stages: research, insights, writing and editing.</p>
  </aside>

  <main>
    <h1>AI Newsletter Generator</h1>
    <label for="topic">Newsletter topic</label>
    <input id="topic" type="text" maxlength="500" placeholder="e.g. quantum error correction" />
    <button id="generateBtn" disabled>Generate Newsletter</button>

    <div id="status" class="status"></div>
    <div id="error" class="error"></div>
    <div id="result" hidden>
      <h2>Your AI Newsletter</h2>
      <p><a id="download" href="#">Download newsletter</a></p>
      <div id="final" class="newsletter"></div>
      <div id="intermediate"></div>
    </div>
  </main>

  <script>
    const el = id => document.getElementById(id);
    let serverKeys = { openai: false, exa: false };

    async function loadModels() {
      const res = await fetch('/api/models');
      const json = await res.json();
      serverKeys = { openai: json.openai_key_configured, exa: json.exa_key_configured };
      for (const m of json.models) {
        const opt = document.createElement('option');
        opt.value = m.id;
        opt.textContent = m.id;
        opt.selected = m.default;
        el('model').appendChild(opt);
      }
      const fallbacks = [];
      if (serverKeys.openai) fallbacks.push('OpenAI');
      if (serverKeys.exa) fallbacks.push('Exa');
      el('keyNote').textContent = fallbacks.length
        ? 'Server keys available for: ' + fallbacks.join(', ') + '. Leave blank to use them.'
        : '';
      refreshButton();
    }

    function refreshButton() {
      const hasTopic = el('topic').value.trim().length > 0;
      const hasOpenai = el('openaiKey').value.trim().length > 0 || serverKeys.openai;
      const hasExa = el('exaKey').value.trim().length > 0 || serverKeys.exa;
      el('generateBtn').disabled = !(hasTopic && hasOpenai && hasExa);
    }

    function section(title, text) {
      const details = document.createElement('details');
      const summary = document.createElement('summary');
      summary.textContent = title;
      const pre = document.createElement('pre');
      pre.textContent = text;
      details.append(summary, pre);
      return details;
    }

    async function generate() {
      const topic = el('topic').value.trim();
      el('generateBtn').disabled = true;
      el('error').textContent = '';
      el('result').hidden = true;
      el('status').textContent = 'Researching, analyzing, writing and editing. This can take a few minutes...';

      try {
        const res = await fetch('/api/newsletter', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({
            topic,
            model: el('model').value || null,
            openai_api_key: el('openaiKey').value.trim() || null,
            exa_api_key: el('exaKey').value.trim() || null,
            show_intermediate: el('showIntermediate').checked
          })
        });
        const json = await res.json();
        if (!res.ok) {
          el('status').textContent = '';
          el('error').textContent = 'Error generating newsletter: ' + json.details + '\n' + json.hint;
          return;
        }

        el('status').textContent = 'Newsletter generated in ' + (json.elapsed_ms / 1000).toFixed(1) + ' seconds';
        el('final').textContent = json.final;
        const blob = new Blob([json.final], { type: 'text/markdown' });
        el('download').href = URL.createObjectURL(blob);
        el('download').download = json.download_filename;

        const intermediate = el('intermediate');
        intermediate.replaceChildren();
        if (json.research) intermediate.append(section('Research results', json.research));
        if (json.insights) intermediate.append(section('Insights', json.insights));
        if (json.draft) intermediate.append(section('Draft', json.draft));
        el('result').hidden = false;
      } catch (e) {
        el('status').textContent = '';
        el('error').textContent = 'Error generating newsletter: ' + e +
          '\nPlease check your API keys and internet connection and try again.';
      } finally {
        refreshButton();
      }
    }

    ['topic', 'openaiKey', 'exaKey'].forEach(id => el(id).addEventListener('input', refreshButton));
    el('generateBtn').addEventListener('click', generate);
    loadModels();
  </script>
</body>
</html>"##)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_index_page() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Generate Newsletter"));
        assert!(html.contains("/api/newsletter"));
        assert!(html.contains("Show intermediate results"));
        assert!(html.contains(r##"<a id="download" href="#">"##));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
