use serde_json::Value as JsonValue;

/// Best-effort human message from a failed remote call, kept as the service phrased it.
pub async fn error_message(resp: reqwest::Response, fallback: &str) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    message_from_body(&text).unwrap_or_else(|| {
        if text.trim().is_empty() {
            format!("{} ({})", fallback, status)
        } else {
            text.trim().to_string()
        }
    })
}

fn message_from_body(text: &str) -> Option<String> {
    let body: JsonValue = serde_json::from_str(text).ok()?;
    let candidates = [
        body.get("message"),
        body.get("error").and_then(|e| e.get("message")),
        body.get("error_description"),
        body.get("error"),
    ];
    let found = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string));
    found
}
