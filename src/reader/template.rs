/// State accumulated across pipeline stages. `responses` grows by one entry
/// per completed stage, in stage order; it is never persisted.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub markdown: String,
    pub responses: Vec<String>,
}

const MARKDOWN_TOKEN: &str = "{markdown}";
const RESPONSE_OPEN: &str = "{response[";
const RESPONSE_CLOSE: &str = "]}";

/// Substitute the two placeholder forms into a stage template:
/// `{markdown}` expands to the full paper text, `{response[k]}` to the output
/// of stage `k`. An out-of-range index yields the empty string rather than an
/// error; templates are fixed, trusted content and any other token passes
/// through unchanged.
pub fn format_template(template: &str, state: &PipelineState) -> String {
    let with_markdown = template.replace(MARKDOWN_TOKEN, &state.markdown);
    substitute_responses(&with_markdown, &state.responses)
}

fn substitute_responses(text: &str, responses: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(RESPONSE_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + RESPONSE_OPEN.len()..];
        match after.find(RESPONSE_CLOSE) {
            Some(end) if end > 0 && after[..end].bytes().all(|b| b.is_ascii_digit()) => {
                if let Some(response) = after[..end]
                    .parse::<usize>()
                    .ok()
                    .and_then(|k| responses.get(k))
                {
                    out.push_str(response);
                }
                rest = &after[end + RESPONSE_CLOSE.len()..];
            }
            _ => {
                // malformed index — not a placeholder, emit verbatim
                out.push_str(RESPONSE_OPEN);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
